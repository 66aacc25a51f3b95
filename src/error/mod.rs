//! Error handling for the RX gap tester

use crate::device::{DeviceError, DeviceErrorKind};
use thiserror::Error;

/// Custom error types for the RX gap tester
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Parsing errors (case specs, fault specs, JSON, etc.)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Driver or device failures
    #[error("Device error: {0}")]
    Device(String),

    /// Timeout errors reported by the driver
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// One or more test cases did not pass
    #[error("Test failure: {0}")]
    TestFailure(String),

    /// The run was stopped by the user
    #[error("Interrupted: {0}")]
    Interrupted(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new device error
    pub fn device<S: Into<String>>(message: S) -> Self {
        Self::Device(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new test failure error
    pub fn test_failure<S: Into<String>>(message: S) -> Self {
        Self::TestFailure(message.into())
    }

    /// Create a new interrupted error
    pub fn interrupted<S: Into<String>>(message: S) -> Self {
        Self::Interrupted(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Validation(_) => "VALIDATION",
            Self::Parse(_) => "PARSE",
            Self::Device(_) => "DEVICE",
            Self::Timeout(_) => "TIMEOUT",
            Self::Io(_) => "IO",
            Self::TestFailure(_) => "TEST",
            Self::Interrupted(_) => "INTERRUPTED",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Check if error is recoverable (re-running may succeed)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Device(_) | Self::Timeout(_) | Self::Interrupted(_) => true,
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => false,
            Self::Io(_) | Self::TestFailure(_) | Self::Internal(_) => false,
        }
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Config(msg) => {
                format!("Configuration problem: {}\n\nSuggestion: Check your .env file or command line arguments.", msg)
            }
            Self::Validation(msg) => {
                format!("Invalid input: {}\n\nSuggestion: Read sizes must not exceed the buffer size and iteration counts must be positive.", msg)
            }
            Self::Parse(msg) => {
                format!("Failed to parse input: {}\n\nSuggestion: Test cases use the form GAP:ITERATIONS, e.g. --case 1024:10000.", msg)
            }
            Self::Device(msg) => {
                format!("Device operation failed: {}\n\nSuggestion: Check that the device is connected, not in use by another process, and loaded with an FPGA image.", msg)
            }
            Self::Timeout(msg) => {
                format!("Device timed out: {}\n\nSuggestion: Increase --timeout-ms or reduce the number of buffers in flight.", msg)
            }
            Self::Io(msg) => {
                format!("File operation failed: {}\n\nSuggestion: Check file permissions and disk space.", msg)
            }
            Self::TestFailure(msg) => {
                format!("Timestamp test failed: {}\n\nSuggestion: Re-run with --keep-going --verbose to see every discontinuity.", msg)
            }
            Self::Interrupted(msg) => {
                format!("Run interrupted: {}", msg)
            }
            Self::Internal(msg) => {
                format!("Internal error: {}\n\nThis is likely a bug. Please report this issue with the error details.", msg)
            }
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => 1,
            Self::Device(_) => 2,
            Self::Timeout(_) => 3,
            Self::Io(_) => 5,
            Self::TestFailure(_) => 6,
            Self::Interrupted(_) => 130,
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Validation(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Device(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Timeout(_) | Self::Interrupted(_) => {
                    format!("[{}] {}", category.blue().bold(), message.blue())
                }
                Self::Io(_) | Self::TestFailure(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

impl From<DeviceError> for AppError {
    fn from(error: DeviceError) -> Self {
        match error.kind() {
            DeviceErrorKind::Timeout => Self::timeout(error.to_string()),
            _ => Self::device(error.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::str::ParseBoolError> for AppError {
    fn from(error: std::str::ParseBoolError) -> Self {
        Self::parse(format!("Boolean parse error: {}", error))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::internal(format!("Test task failed: {}", error))
    }
}

// Anyhow integration
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(error.to_string())
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error context trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error, keeping its category
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error
    fn context(self, message: &'static str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<AppError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let original = e.into();
            let message = format!("{}: {}", f(), inner_message(&original));
            match original {
                AppError::Config(_) => AppError::Config(message),
                AppError::Validation(_) => AppError::Validation(message),
                AppError::Parse(_) => AppError::Parse(message),
                AppError::Device(_) => AppError::Device(message),
                AppError::Timeout(_) => AppError::Timeout(message),
                AppError::Io(_) => AppError::Io(message),
                AppError::TestFailure(_) => AppError::TestFailure(message),
                AppError::Interrupted(_) => AppError::Interrupted(message),
                AppError::Internal(_) => AppError::Internal(message),
            }
        })
    }

    fn context(self, message: &'static str) -> Result<T> {
        self.with_context(|| message.to_string())
    }
}

fn inner_message(error: &AppError) -> &str {
    match error {
        AppError::Config(m)
        | AppError::Validation(m)
        | AppError::Parse(m)
        | AppError::Device(m)
        | AppError::Timeout(m)
        | AppError::Io(m)
        | AppError::TestFailure(m)
        | AppError::Interrupted(m)
        | AppError::Internal(m) => m,
    }
}

/// Error reporter for user feedback on stderr
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Render an error the way `report_error` prints it
    pub fn render(&self, error: &AppError) -> String {
        let mut out = error.format_for_console(self.use_color);
        if self.verbose {
            out.push_str("\n\n");
            out.push_str(&error.user_friendly_message());
            if error.is_recoverable() {
                out.push_str("\n\nThis error might be temporary. You can try running the command again.");
            }
        }
        out
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", self.render(error));
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_error = AppError::config("Invalid configuration");
        assert_eq!(config_error.category(), "CONFIG");
        assert!(!config_error.is_recoverable());
        assert_eq!(config_error.exit_code(), 1);

        let device_error = AppError::device("No devices available");
        assert_eq!(device_error.category(), "DEVICE");
        assert!(device_error.is_recoverable());
        assert_eq!(device_error.exit_code(), 2);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::config("test").exit_code(), 1);
        assert_eq!(AppError::parse("test").exit_code(), 1);
        assert_eq!(AppError::device("test").exit_code(), 2);
        assert_eq!(AppError::timeout("test").exit_code(), 3);
        assert_eq!(AppError::io("test").exit_code(), 5);
        assert_eq!(AppError::test_failure("test").exit_code(), 6);
        assert_eq!(AppError::interrupted("test").exit_code(), 130);
        assert_eq!(AppError::internal("test").exit_code(), 99);
    }

    #[test]
    fn test_device_error_conversion() {
        let timeout: AppError = DeviceError::from_code(-6).into();
        assert_eq!(timeout.category(), "TIMEOUT");
        assert!(timeout.to_string().contains("An operation timed out"));

        let nodev: AppError = DeviceError::from_code(-7).into();
        assert_eq!(nodev.category(), "DEVICE");
    }

    #[test]
    fn test_context_keeps_category() {
        let result: std::result::Result<(), DeviceError> = Err(DeviceError::from_code(-6));
        let error = result.context("Initial RX failed").unwrap_err();

        assert_eq!(error.category(), "TIMEOUT");
        assert!(error.to_string().starts_with("Timeout error: Initial RX failed: "));
    }

    #[test]
    fn test_error_conversions() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let app_error: AppError = io_error.into();
        assert_eq!(app_error.category(), "IO");

        let parse_error = "not_a_number".parse::<u32>().unwrap_err();
        let app_error: AppError = parse_error.into();
        assert_eq!(app_error.category(), "PARSE");

        let dotenv_error = dotenv::Error::LineParse(".env".to_string(), 1);
        let app_error: AppError = dotenv_error.into();
        assert_eq!(app_error.category(), "CONFIG");
    }

    #[test]
    fn test_anyhow_integration() {
        let app_error: AppError = anyhow::anyhow!("boom").into();
        assert_eq!(app_error.category(), "INTERNAL");
    }

    #[test]
    fn test_console_formatting() {
        let error = AppError::test_failure("1 of 3 cases failed");
        let plain = error.format_for_console(false);
        assert_eq!(plain, "[TEST] Test failure: 1 of 3 cases failed");
        assert!(error.format_for_console(true).contains("TEST"));
    }

    #[test]
    fn test_reporter_render_verbose() {
        let reporter = ErrorReporter::new(false, true);
        let rendered = reporter.render(&AppError::timeout("RX 3 failed"));
        assert!(rendered.contains("[TIMEOUT]"));
        assert!(rendered.contains("Suggestion:"));
        assert!(rendered.contains("might be temporary"));

        let quiet = ErrorReporter::new(false, false).render(&AppError::config("bad"));
        assert!(!quiet.contains("Suggestion:"));
    }
}
