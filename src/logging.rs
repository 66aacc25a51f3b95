//! Structured logging for the RX gap tester
//!
//! Log entries carry a level, a component name, the run's session id and
//! free-form structured fields. They render as human-readable console
//! lines, single-line JSON or a compact form, and always go to stderr so
//! the report on stdout stays machine readable.

use crate::device::DeviceError;
use crate::error::{AppError, Result};
use crate::models::{Config, StreamParams, TestCase};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, RwLock};
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Get ANSI color code for console output
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Trace => "\x1b[37m",
            LogLevel::Debug => "\x1b[36m",
            LogLevel::Info => "\x1b[32m",
            LogLevel::Warn => "\x1b[33m",
            LogLevel::Error => "\x1b[31m",
        }
    }

    pub fn reset_code() -> &'static str {
        "\x1b[0m"
    }

    /// Level implied by the verbosity flags
    pub fn for_config(config: &Config) -> Self {
        if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(AppError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Component name
    pub logger: String,
    /// Run identifier shared by every entry of a session
    pub session_id: Option<String>,
    pub fields: BTreeMap<String, serde_json::Value>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// JSON format for structured logging
    Json,
}

/// Logger with a minimum level, an output format and a shared session id
#[derive(Clone)]
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    format: LogFormat,
    name: String,
    session_id: Arc<RwLock<Option<String>>>,
    capture: Option<Arc<Mutex<Vec<String>>>>,
}

impl Logger {
    /// Create a new logger
    pub fn new(name: &str) -> Self {
        Self {
            min_level: LogLevel::Info,
            use_color: false,
            format: LogFormat::Console,
            name: name.to_string(),
            session_id: Arc::new(RwLock::new(None)),
            capture: None,
        }
    }

    /// Create a logger with specific configuration
    pub fn with_config(name: &str, config: &Config) -> Self {
        Self {
            min_level: LogLevel::for_config(config),
            use_color: config.enable_color,
            format: if config.json_output { LogFormat::Json } else { LogFormat::Console },
            name: name.to_string(),
            session_id: Arc::new(RwLock::new(None)),
            capture: None,
        }
    }

    /// Derive a logger for another component sharing this one's settings
    pub fn named(&self, name: &str) -> Self {
        Self { name: name.to_string(), ..self.clone() }
    }

    /// Collect rendered lines in memory instead of writing to stderr
    pub fn capture(mut self) -> (Self, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        self.capture = Some(lines.clone());
        (self, lines)
    }

    pub fn set_level(&mut self, level: LogLevel) {
        self.min_level = level;
    }

    /// Set the session id attached to every entry
    pub fn set_session_id(&self, session_id: &str) {
        if let Ok(mut guard) = self.session_id.write() {
            *guard = Some(session_id.to_string());
        }
    }

    pub fn session_id(&self) -> Option<String> {
        self.session_id.read().ok().and_then(|guard| guard.clone())
    }

    /// Create a log entry builder
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    fn write_entry(&self, mut entry: LogEntry) {
        if entry.level < self.min_level {
            return;
        }
        entry.session_id = self.session_id();

        let output = match self.format {
            LogFormat::Console => self.format_console(&entry),
            LogFormat::Json => self.format_json(&entry),
        };

        match &self.capture {
            Some(lines) => {
                if let Ok(mut lines) = lines.lock() {
                    lines.push(output);
                }
            }
            None => {
                let _ = writeln!(io::stderr(), "{}", output);
            }
        }
    }

    /// Format log entry for console output
    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = entry.level.as_str();

        let formatted_level = if self.use_color {
            format!("{}{:>5}{}", entry.level.color_code(), level_str, LogLevel::reset_code())
        } else {
            format!("{:>5}", level_str)
        };

        let mut output = format!("{} {} [{}] {}", timestamp, formatted_level, entry.logger, entry.message);

        if let Some(session_id) = &entry.session_id {
            output.push_str(&format!(" [{}]", &session_id[..session_id.len().min(8)]));
        }

        if !entry.fields.is_empty() {
            let fields_str: Vec<String> = entry.fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            output.push_str(&format!(" {{{}}}", fields_str.join(", ")));
        }

        output
    }

    /// Format log entry as JSON
    fn format_json(&self, entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => format!("{{\"error\": \"Failed to serialize log entry\", \"message\": {:?}}}", entry.message),
        }
    }
}

/// Builder pattern for creating log entries
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                session_id: None,
                fields: BTreeMap::new(),
            },
        }
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    /// Add the test case being run
    pub fn case(self, case: &TestCase) -> Self {
        self.field("gap", case.gap).field("iterations", case.iterations)
    }

    /// Add error information
    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
            .field("error_exit_code", error.exit_code())
    }

    /// Add driver status information
    pub fn device_error(self, error: &DeviceError) -> Self {
        self.field("status_code", error.code())
            .field("status_kind", format!("{:?}", error.kind()))
    }

    /// Finalize and write the log entry
    pub fn log(self) {
        self.logger.write_entry(self.entry);
    }
}

/// Logger for device operations
///
/// Driver failures are recorded at debug level; the progress reporter
/// and the run report are what surface them to the user.
pub struct DeviceLogger {
    logger: Logger,
}

impl DeviceLogger {
    pub fn new(logger: &Logger) -> Self {
        Self { logger: logger.named("DEV") }
    }

    pub fn log_opened(&self, description: &str) {
        self.logger.info(&format!("Opened {}", description))
            .field("device", description)
            .log();
    }

    pub fn log_sync_config(&self, params: &StreamParams, result: std::result::Result<(), &DeviceError>) {
        match result {
            Ok(()) => self.logger.debug("Configured RX sync interface")
                .field("num_buffers", params.num_buffers)
                .field("buffer_size", params.buffer_size)
                .field("num_transfers", params.num_transfers)
                .field("timeout_ms", params.timeout_ms)
                .log(),
            Err(e) => self.logger.debug(&format!("Failed to configure RX sync i/f: {}", e))
                .device_error(e)
                .log(),
        }
    }

    pub fn log_enable(&self, enable: bool, result: std::result::Result<(), &DeviceError>) {
        let action = if enable { "enable" } else { "disable" };
        match result {
            Ok(()) => self.logger.debug(&format!("RX module {}d", action))
                .field("enable", enable)
                .log(),
            Err(e) => self.logger.debug(&format!("Failed to {} RX module: {}", action, e))
                .field("enable", enable)
                .device_error(e)
                .log(),
        }
    }

    pub fn log_read_failure(&self, iteration: Option<u32>, error: &DeviceError) {
        let message = match iteration {
            Some(i) => format!("RX {} failed: {}", i, error),
            None => format!("Initial RX failed: {}", error),
        };
        self.logger.debug(&message)
            .field("iteration", iteration)
            .device_error(error)
            .log();
    }
}

/// Creates loggers that share a session id
pub struct LoggerFactory {
    base: Logger,
    session_id: String,
}

impl LoggerFactory {
    pub fn new(config: &Config) -> Self {
        let session_id = Uuid::new_v4().to_string();
        let base = Logger::with_config("APP", config);
        base.set_session_id(&session_id);
        Self { base, session_id }
    }

    pub fn create_logger(&self, name: &str) -> Logger {
        self.base.named(name)
    }

    pub fn create_device_logger(&self) -> DeviceLogger {
        DeviceLogger::new(&self.base)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}
