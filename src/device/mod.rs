//! Receive-side device abstraction
//!
//! The driver library is an external collaborator; this module only
//! describes the slice of it the timestamp test needs (stream
//! configuration, module enable/disable, synchronous receive with
//! metadata) and provides the backends that implement it.

mod error;
pub mod sim;
#[cfg(feature = "bladerf")]
pub mod bladerf;

pub use error::{DeviceError, DeviceErrorKind, DeviceResult};
pub use sim::{Fault, SimulatedDevice};

use crate::{
    error::{AppError, Result},
    models::{Config, StreamParams},
    types::Backend,
};
use serde::{Deserialize, Serialize};

/// Metadata status bit: samples were dropped on the device side
pub const META_STATUS_OVERRUN: u32 = 1 << 0;
/// Metadata status bit: the device ran out of samples to transmit
pub const META_STATUS_UNDERRUN: u32 = 1 << 1;

/// Per-call receive metadata
///
/// On input a `timestamp` of 0 requests whatever samples are available.
/// On output it holds the timestamp of the first returned sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RxMetadata {
    pub timestamp: u64,
    pub flags: u32,
    pub status: u32,
    pub actual_count: u32,
}

impl RxMetadata {
    /// Metadata with every field cleared
    pub fn cleared() -> Self {
        Self::default()
    }

    /// Names of the status bits that are set
    pub fn status_names(&self) -> Vec<&'static str> {
        describe_status(self.status)
    }
}

/// Decode a metadata status word into bit names
pub fn describe_status(status: u32) -> Vec<&'static str> {
    let mut names = Vec::new();
    if status & META_STATUS_OVERRUN != 0 {
        names.push("overrun");
    }
    if status & META_STATUS_UNDERRUN != 0 {
        names.push("underrun");
    }
    if status & !(META_STATUS_OVERRUN | META_STATUS_UNDERRUN) != 0 {
        names.push("unknown");
    }
    names
}

/// The receive operations the timestamp test drives
pub trait RxDevice {
    /// Configure the synchronous RX interface
    fn sync_config(&mut self, params: &StreamParams) -> DeviceResult<()>;

    /// Enable or disable the RX module
    fn enable_rx(&mut self, enable: bool) -> DeviceResult<()>;

    /// Receive `num_samples` SC16 Q11 samples into `samples`
    ///
    /// `samples` holds interleaved I/Q pairs and must be at least
    /// `2 * num_samples` long.
    fn sync_rx(
        &mut self,
        samples: &mut [i16],
        num_samples: usize,
        meta: &mut RxMetadata,
        timeout_ms: u32,
    ) -> DeviceResult<()>;

    /// Short description for logs and reports
    fn describe(&self) -> String;
}

impl<D: RxDevice + ?Sized> RxDevice for Box<D> {
    fn sync_config(&mut self, params: &StreamParams) -> DeviceResult<()> {
        (**self).sync_config(params)
    }

    fn enable_rx(&mut self, enable: bool) -> DeviceResult<()> {
        (**self).enable_rx(enable)
    }

    fn sync_rx(
        &mut self,
        samples: &mut [i16],
        num_samples: usize,
        meta: &mut RxMetadata,
        timeout_ms: u32,
    ) -> DeviceResult<()> {
        (**self).sync_rx(samples, num_samples, meta, timeout_ms)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Open the device selected by the configuration
pub fn open_device(config: &Config) -> Result<Box<dyn RxDevice + Send>> {
    match config.backend {
        Backend::Sim => {
            let device = SimulatedDevice::new(config.sim_start_timestamp, config.sim_ticks_per_sample)
                .with_faults(config.sim_faults.clone());
            Ok(Box::new(device))
        }
        Backend::Bladerf => open_bladerf(config.device.as_deref()),
    }
}

#[cfg(feature = "bladerf")]
fn open_bladerf(identifier: Option<&str>) -> Result<Box<dyn RxDevice + Send>> {
    let device = bladerf::BladerfDevice::open(identifier)
        .map_err(|e| AppError::device(format!("Failed to open device: {}", e)))?;
    Ok(Box::new(device))
}

#[cfg(not(feature = "bladerf"))]
fn open_bladerf(_identifier: Option<&str>) -> Result<Box<dyn RxDevice + Send>> {
    Err(AppError::config(
        "bladerf backend not available: rebuild with `--features bladerf`",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_status() {
        assert!(describe_status(0).is_empty());
        assert_eq!(describe_status(META_STATUS_OVERRUN), vec!["overrun"]);
        assert_eq!(
            describe_status(META_STATUS_OVERRUN | META_STATUS_UNDERRUN | 0x100),
            vec!["overrun", "underrun", "unknown"]
        );
    }

    #[test]
    fn test_open_sim_device() {
        let config = Config::default();
        let device = open_device(&config).unwrap();
        assert!(device.describe().starts_with("simulated"));
    }

    #[cfg(not(feature = "bladerf"))]
    #[test]
    fn test_bladerf_backend_requires_feature() {
        let mut config = Config::default();
        config.backend = Backend::Bladerf;
        let err = open_device(&config).err().unwrap();
        assert_eq!(err.category(), "CONFIG");
    }
}
