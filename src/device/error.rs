//! Driver status codes and their error strings

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure classes reported by the driver as negative status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceErrorKind {
    Unexpected,
    Range,
    Inval,
    Mem,
    Io,
    Timeout,
    NoDev,
    Unsupported,
    Misaligned,
    Checksum,
    NoFile,
    UpdateFpga,
    UpdateFw,
    TimePast,
    QueueFull,
    FpgaOp,
    Permission,
    WouldBlock,
    NotInit,
    /// A code this crate does not know about
    Unknown,
}

impl DeviceErrorKind {
    const TABLE: &'static [(i32, DeviceErrorKind, &'static str)] = &[
        (-1, Self::Unexpected, "unexpected"),
        (-2, Self::Range, "range"),
        (-3, Self::Inval, "inval"),
        (-4, Self::Mem, "mem"),
        (-5, Self::Io, "io"),
        (-6, Self::Timeout, "timeout"),
        (-7, Self::NoDev, "nodev"),
        (-8, Self::Unsupported, "unsupported"),
        (-9, Self::Misaligned, "misaligned"),
        (-10, Self::Checksum, "checksum"),
        (-11, Self::NoFile, "no-file"),
        (-12, Self::UpdateFpga, "update-fpga"),
        (-13, Self::UpdateFw, "update-fw"),
        (-14, Self::TimePast, "time-past"),
        (-15, Self::QueueFull, "queue-full"),
        (-16, Self::FpgaOp, "fpga-op"),
        (-17, Self::Permission, "permission"),
        (-18, Self::WouldBlock, "would-block"),
        (-19, Self::NotInit, "not-init"),
    ];

    /// Map a driver status code to its kind
    pub fn from_code(code: i32) -> Self {
        Self::TABLE
            .iter()
            .find(|(c, _, _)| *c == code)
            .map(|(_, kind, _)| *kind)
            .unwrap_or(Self::Unknown)
    }

    /// The driver status code for this kind, -1 for `Unknown`
    pub fn code(&self) -> i32 {
        Self::TABLE
            .iter()
            .find(|(_, kind, _)| kind == self)
            .map(|(c, _, _)| *c)
            .unwrap_or(-1)
    }

    /// Parse a short name (`timeout`) or a raw negative code (`-6`)
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if let Ok(code) = name.parse::<i32>() {
            return match Self::from_code(code) {
                Self::Unknown => None,
                kind => Some(kind),
            };
        }
        let lowered = name.to_lowercase();
        Self::TABLE
            .iter()
            .find(|(_, _, n)| *n == lowered)
            .map(|(_, kind, _)| *kind)
    }

    /// Human readable description, as the driver's strerror returns it
    pub fn description(&self) -> &'static str {
        match self {
            Self::Unexpected => "An unexpected error occurred",
            Self::Range => "Provided parameter was out of the allowable range",
            Self::Inval => "Invalid operation or parameter",
            Self::Mem => "A memory allocation error occurred",
            Self::Io => "File or device I/O failure",
            Self::Timeout => "An operation timed out",
            Self::NoDev => "No devices available",
            Self::Unsupported => "Operation not supported",
            Self::Misaligned => "Misaligned flash access",
            Self::Checksum => "Invalid checksum",
            Self::NoFile => "File not found",
            Self::UpdateFpga => "An FPGA update is required",
            Self::UpdateFw => "A firmware update is required",
            Self::TimePast => "Requested timestamp is in the past",
            Self::QueueFull => "Could not enqueue data into full queue",
            Self::FpgaOp => "An FPGA operation reported a failure",
            Self::Permission => "Insufficient permissions for the requested operation",
            Self::WouldBlock => "The operation would block, but has been requested to be non-blocking",
            Self::NotInit => "Device insufficiently initialized for operation",
            Self::Unknown => "Unknown error code",
        }
    }
}

/// A non-zero status returned by a device operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DeviceError {
    code: i32,
    message: String,
}

impl DeviceError {
    /// Build an error from a status code using the built-in descriptions
    pub fn from_code(code: i32) -> Self {
        Self {
            code,
            message: DeviceErrorKind::from_code(code).description().to_string(),
        }
    }

    /// Build an error with a driver-supplied message
    pub fn with_message<S: Into<String>>(code: i32, message: S) -> Self {
        Self { code, message: message.into() }
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn kind(&self) -> DeviceErrorKind {
        DeviceErrorKind::from_code(self.code)
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<DeviceErrorKind> for DeviceError {
    fn from(kind: DeviceErrorKind) -> Self {
        Self::from_code(kind.code())
    }
}

/// Result type for device operations
pub type DeviceResult<T> = std::result::Result<T, DeviceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_mapping() {
        assert_eq!(DeviceErrorKind::from_code(-6), DeviceErrorKind::Timeout);
        assert_eq!(DeviceErrorKind::from_code(-19), DeviceErrorKind::NotInit);
        assert_eq!(DeviceErrorKind::from_code(-42), DeviceErrorKind::Unknown);
        assert_eq!(DeviceErrorKind::Timeout.code(), -6);
        assert_eq!(DeviceErrorKind::Unknown.code(), -1);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(DeviceErrorKind::from_name("timeout"), Some(DeviceErrorKind::Timeout));
        assert_eq!(DeviceErrorKind::from_name("IO"), Some(DeviceErrorKind::Io));
        assert_eq!(DeviceErrorKind::from_name("-7"), Some(DeviceErrorKind::NoDev));
        assert_eq!(DeviceErrorKind::from_name("-99"), None);
        assert_eq!(DeviceErrorKind::from_name("bogus"), None);
    }

    #[test]
    fn test_error_display() {
        let err = DeviceError::from_code(-6);
        assert_eq!(err.to_string(), "An operation timed out");
        assert_eq!(err.kind(), DeviceErrorKind::Timeout);

        let custom = DeviceError::with_message(-5, "USB transfer stalled");
        assert_eq!(custom.to_string(), "USB transfer stalled");
        assert_eq!(custom.kind(), DeviceErrorKind::Io);
    }
}
