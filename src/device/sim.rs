//! In-process simulated receiver
//!
//! Models a free-running timestamp counter that advances by
//! `ticks_per_sample` for every delivered sample. Faults can be scheduled
//! against read indices to reproduce discontinuities, overruns and driver
//! errors without hardware.

use super::{DeviceError, DeviceErrorKind, DeviceResult, RxDevice, RxMetadata, META_STATUS_OVERRUN};
use crate::{error::AppError, models::StreamParams};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A scheduled fault
///
/// `read` counts receive calls since the RX module was last enabled;
/// read 0 is the initial read of a test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fault {
    /// Skip `samples` samples before serving the read (a gap)
    Drop { read: u64, samples: u64 },
    /// Step the clock back by `samples` samples (an overlap)
    Repeat { read: u64, samples: u64 },
    /// Report an overrun in the metadata status word
    Overrun { read: u64 },
    /// Fail the read with a driver status code
    Error { read: u64, kind: DeviceErrorKind },
}

impl Fault {
    pub fn read(&self) -> u64 {
        match self {
            Self::Drop { read, .. }
            | Self::Repeat { read, .. }
            | Self::Overrun { read }
            | Self::Error { read, .. } => *read,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drop { read, samples } => write!(f, "drop:{}:{}", read, samples),
            Self::Repeat { read, samples } => write!(f, "repeat:{}:{}", read, samples),
            Self::Overrun { read } => write!(f, "overrun:{}", read),
            Self::Error { read, kind } => write!(f, "error:{}:{}", read, kind.code()),
        }
    }
}

impl FromStr for Fault {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        let number = |idx: usize, what: &str| -> Result<u64, AppError> {
            parts
                .get(idx)
                .ok_or_else(|| AppError::parse(format!("Fault '{}' is missing {}", s, what)))?
                .trim()
                .parse::<u64>()
                .map_err(|e| AppError::parse(format!("Invalid {} in fault '{}': {}", what, s, e)))
        };

        let fault = match parts[0].to_lowercase().as_str() {
            "drop" if parts.len() == 3 => Self::Drop { read: number(1, "read index")?, samples: number(2, "sample count")? },
            "repeat" if parts.len() == 3 => Self::Repeat { read: number(1, "read index")?, samples: number(2, "sample count")? },
            "overrun" if parts.len() == 2 => Self::Overrun { read: number(1, "read index")? },
            "error" if parts.len() == 3 => {
                let kind = DeviceErrorKind::from_name(parts[2])
                    .ok_or_else(|| AppError::parse(format!("Unknown error code '{}' in fault '{}'", parts[2], s)))?;
                Self::Error { read: number(1, "read index")?, kind }
            }
            _ => {
                return Err(AppError::parse(format!(
                    "Invalid fault '{}': expected drop:READ:SAMPLES, repeat:READ:SAMPLES, overrun:READ or error:READ:CODE",
                    s
                )))
            }
        };

        Ok(fault)
    }
}

/// Simulated receiver with a deterministic sample clock
#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    clock: u64,
    start_timestamp: u64,
    ticks_per_sample: u64,
    params: Option<StreamParams>,
    enabled: bool,
    reads_since_enable: u64,
    total_reads: u64,
    enable_count: u32,
    disable_count: u32,
    faults: Vec<Fault>,
}

impl SimulatedDevice {
    pub fn new(start_timestamp: u64, ticks_per_sample: u64) -> Self {
        Self {
            clock: start_timestamp,
            start_timestamp,
            ticks_per_sample,
            params: None,
            enabled: false,
            reads_since_enable: 0,
            total_reads: 0,
            enable_count: 0,
            disable_count: 0,
            faults: Vec::new(),
        }
    }

    pub fn with_faults(mut self, faults: Vec<Fault>) -> Self {
        self.faults = faults;
        self
    }

    pub fn add_fault(&mut self, fault: Fault) {
        self.faults.push(fault);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn total_reads(&self) -> u64 {
        self.total_reads
    }

    pub fn enable_count(&self) -> u32 {
        self.enable_count
    }

    pub fn disable_count(&self) -> u32 {
        self.disable_count
    }

    /// Timestamp the next read will carry, absent faults
    pub fn clock(&self) -> u64 {
        self.clock
    }

    fn ticks(&self, samples: u64) -> u64 {
        samples.wrapping_mul(self.ticks_per_sample)
    }
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new(crate::defaults::SIM_START_TIMESTAMP, crate::defaults::SIM_TICKS_PER_SAMPLE)
    }
}

impl RxDevice for SimulatedDevice {
    fn sync_config(&mut self, params: &StreamParams) -> DeviceResult<()> {
        if params.num_buffers == 0 || params.buffer_size == 0 || params.num_transfers == 0 {
            return Err(DeviceError::with_message(DeviceErrorKind::Inval.code(), "Stream parameters must be non-zero"));
        }
        if params.buffer_size % 1024 != 0 {
            return Err(DeviceError::with_message(
                DeviceErrorKind::Inval.code(),
                format!("Buffer size {} is not a multiple of 1024", params.buffer_size),
            ));
        }
        if params.num_transfers >= params.num_buffers {
            return Err(DeviceError::with_message(
                DeviceErrorKind::Inval.code(),
                format!("{} transfers requires more than {} buffers", params.num_transfers, params.num_buffers),
            ));
        }

        self.params = Some(params.clone());
        Ok(())
    }

    fn enable_rx(&mut self, enable: bool) -> DeviceResult<()> {
        if enable {
            self.enable_count += 1;
            self.reads_since_enable = 0;
        } else {
            self.disable_count += 1;
        }
        self.enabled = enable;
        Ok(())
    }

    fn sync_rx(
        &mut self,
        samples: &mut [i16],
        num_samples: usize,
        meta: &mut RxMetadata,
        _timeout_ms: u32,
    ) -> DeviceResult<()> {
        if self.params.is_none() {
            return Err(DeviceErrorKind::NotInit.into());
        }
        if !self.enabled {
            return Err(DeviceError::with_message(DeviceErrorKind::Inval.code(), "RX module is not enabled"));
        }
        if samples.len() < num_samples * 2 {
            return Err(DeviceError::with_message(
                DeviceErrorKind::Inval.code(),
                format!("Buffer holds {} values, {} samples requested", samples.len(), num_samples),
            ));
        }

        let index = self.reads_since_enable;
        self.reads_since_enable += 1;
        self.total_reads += 1;

        let mut status = 0;
        for fault in self.faults.iter().filter(|f| f.read() == index) {
            match fault {
                Fault::Error { kind, .. } => return Err((*kind).into()),
                Fault::Drop { samples, .. } => self.clock = self.clock.wrapping_add(samples.wrapping_mul(self.ticks_per_sample)),
                Fault::Repeat { samples, .. } => self.clock = self.clock.wrapping_sub(samples.wrapping_mul(self.ticks_per_sample)),
                Fault::Overrun { .. } => status |= META_STATUS_OVERRUN,
            }
        }

        // Q11 ramp keyed to the sample clock
        let first = self.clock.wrapping_sub(self.start_timestamp) / self.ticks_per_sample.max(1);
        for (n, iq) in samples[..num_samples * 2].chunks_exact_mut(2).enumerate() {
            let value = (first.wrapping_add(n as u64) & 0x7ff) as i16;
            iq[0] = value;
            iq[1] = -value;
        }

        meta.timestamp = self.clock;
        meta.status = status;
        meta.actual_count = num_samples as u32;

        self.clock = self.clock.wrapping_add(self.ticks(num_samples as u64));
        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "simulated receiver (start=0x{:x}, {} ticks/sample, {} faults)",
            self.start_timestamp,
            self.ticks_per_sample,
            self.faults.len()
        )
    }
}
