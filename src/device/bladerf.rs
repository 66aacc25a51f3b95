//! libbladeRF backend
//!
//! Thin FFI binding over the handful of libbladeRF calls the timestamp
//! test needs. Built only with the `bladerf` feature, which links the
//! system library.

use super::{DeviceError, DeviceResult, RxDevice, RxMetadata};
use crate::models::StreamParams;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_uint, c_void};
use std::ptr;

type BladerfHandle = c_void;

// bladerf_module / bladerf_channel_layout
const BLADERF_MODULE_RX: c_int = 0;
const BLADERF_RX_X1: c_int = 0;
// bladerf_format
const BLADERF_FORMAT_SC16_Q11_META: c_int = 1;
// Read whatever is available instead of scheduling at `timestamp`
const BLADERF_META_FLAG_RX_NOW: u32 = 1 << 31;

#[repr(C)]
struct BladerfMetadata {
    timestamp: u64,
    flags: u32,
    status: u32,
    actual_count: c_uint,
    reserved: [u8; 32],
}

extern "C" {
    fn bladerf_open(device: *mut *mut BladerfHandle, identifier: *const c_char) -> c_int;
    fn bladerf_close(device: *mut BladerfHandle);
    fn bladerf_sync_config(
        dev: *mut BladerfHandle,
        layout: c_int,
        format: c_int,
        num_buffers: c_uint,
        buffer_size: c_uint,
        num_transfers: c_uint,
        stream_timeout: c_uint,
    ) -> c_int;
    fn bladerf_enable_module(dev: *mut BladerfHandle, module: c_int, enable: bool) -> c_int;
    fn bladerf_sync_rx(
        dev: *mut BladerfHandle,
        samples: *mut c_void,
        num_samples: c_uint,
        metadata: *mut BladerfMetadata,
        timeout_ms: c_uint,
    ) -> c_int;
    fn bladerf_strerror(error: c_int) -> *const c_char;
}

impl BladerfMetadata {
    /// Driver metadata for a read request; timestamp 0 means "now"
    fn request(meta: &RxMetadata) -> Self {
        let mut flags = meta.flags & !BLADERF_META_FLAG_RX_NOW;
        if meta.timestamp == 0 {
            flags |= BLADERF_META_FLAG_RX_NOW;
        }
        Self {
            timestamp: meta.timestamp,
            flags,
            status: 0,
            actual_count: 0,
            reserved: [0; 32],
        }
    }
}

/// Convert a libbladeRF status code into a result
fn check(status: c_int) -> DeviceResult<()> {
    if status == 0 {
        return Ok(());
    }
    // SAFETY: bladerf_strerror returns a pointer to a static string
    let message = unsafe {
        let text = bladerf_strerror(status);
        if text.is_null() {
            return Err(DeviceError::from_code(status));
        }
        CStr::from_ptr(text).to_string_lossy().into_owned()
    };
    Err(DeviceError::with_message(status, message))
}

/// An open libbladeRF device handle
pub struct BladerfDevice {
    handle: *mut BladerfHandle,
    identifier: String,
}

// The handle is only ever used from the thread that owns the device.
unsafe impl Send for BladerfDevice {}

impl BladerfDevice {
    /// Open a device; `None` opens the first one found
    pub fn open(identifier: Option<&str>) -> DeviceResult<Self> {
        let identifier = identifier.unwrap_or("").to_string();
        let c_identifier = CString::new(identifier.clone())
            .map_err(|_| DeviceError::with_message(-3, "Device identifier contains a NUL byte"))?;

        let mut handle: *mut BladerfHandle = ptr::null_mut();
        let id_ptr = if identifier.is_empty() { ptr::null() } else { c_identifier.as_ptr() };
        check(unsafe { bladerf_open(&mut handle, id_ptr) })?;

        Ok(Self { handle, identifier })
    }
}

impl RxDevice for BladerfDevice {
    fn sync_config(&mut self, params: &StreamParams) -> DeviceResult<()> {
        check(unsafe {
            bladerf_sync_config(
                self.handle,
                BLADERF_RX_X1,
                BLADERF_FORMAT_SC16_Q11_META,
                params.num_buffers,
                params.buffer_size,
                params.num_transfers,
                params.timeout_ms,
            )
        })
    }

    fn enable_rx(&mut self, enable: bool) -> DeviceResult<()> {
        check(unsafe { bladerf_enable_module(self.handle, BLADERF_MODULE_RX, enable) })
    }

    fn sync_rx(
        &mut self,
        samples: &mut [i16],
        num_samples: usize,
        meta: &mut RxMetadata,
        timeout_ms: u32,
    ) -> DeviceResult<()> {
        if samples.len() < num_samples * 2 {
            return Err(DeviceError::with_message(-3, "Sample buffer too small for request"));
        }

        let mut raw = BladerfMetadata::request(meta);

        check(unsafe {
            bladerf_sync_rx(
                self.handle,
                samples.as_mut_ptr() as *mut c_void,
                num_samples as c_uint,
                &mut raw,
                timeout_ms,
            )
        })?;

        meta.timestamp = raw.timestamp;
        meta.flags = raw.flags & !BLADERF_META_FLAG_RX_NOW;
        meta.status = raw.status;
        meta.actual_count = raw.actual_count;
        Ok(())
    }

    fn describe(&self) -> String {
        if self.identifier.is_empty() {
            "bladeRF (first available)".to_string()
        } else {
            format!("bladeRF ({})", self.identifier)
        }
    }
}

impl Drop for BladerfDevice {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { bladerf_close(self.handle) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timestamp_reads_now() {
        let raw = BladerfMetadata::request(&RxMetadata::cleared());
        assert_eq!(raw.timestamp, 0);
        assert_eq!(raw.flags, BLADERF_META_FLAG_RX_NOW);
    }

    #[test]
    fn test_scheduled_read_keeps_timestamp() {
        let meta = RxMetadata { timestamp: 0x1000, flags: BLADERF_META_FLAG_RX_NOW | 0x1, ..RxMetadata::cleared() };
        let raw = BladerfMetadata::request(&meta);
        assert_eq!(raw.timestamp, 0x1000);
        assert_eq!(raw.flags, 0x1);
    }
}
