//! Configuration data model and validation

use crate::{
    device::Fault,
    models::{StreamParams, TestCase},
    types::{AppError, Backend, Result},
};
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Device backend to drive
    #[serde(default = "default_backend")]
    pub backend: Backend,

    /// Driver device identifier (backend specific)
    #[serde(default)]
    pub device: Option<String>,

    /// Test cases to run, in order
    #[serde(default = "TestCase::default_cases")]
    pub cases: Vec<TestCase>,

    /// Synchronous interface parameters
    #[serde(default)]
    pub stream: StreamParams,

    /// Timestamp ticks per sample
    #[serde(default = "default_timestamp_step")]
    pub timestamp_step: u64,

    /// Keep reading after the first anomaly of a case
    #[serde(default)]
    pub keep_going: bool,

    /// Emit the run report as JSON
    #[serde(default)]
    pub json_output: bool,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,

    /// Simulator: timestamp of the first sample
    #[serde(default = "default_sim_start")]
    pub sim_start_timestamp: u64,

    /// Simulator: clock ticks per sample
    #[serde(default = "default_sim_ticks")]
    pub sim_ticks_per_sample: u64,

    /// Simulator: scheduled faults
    #[serde(default)]
    pub sim_faults: Vec<Fault>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            device: None,
            cases: TestCase::default_cases(),
            stream: StreamParams::default(),
            timestamp_step: default_timestamp_step(),
            keep_going: false,
            json_output: false,
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
            sim_start_timestamp: default_sim_start(),
            sim_ticks_per_sample: default_sim_ticks(),
            sim_faults: Vec::new(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.cases.is_empty() {
            return Err(AppError::config("At least one test case is required"));
        }

        let stream = &self.stream;
        if stream.buffer_size == 0 || stream.buffer_size % 1024 != 0 {
            return Err(AppError::config(format!(
                "Buffer size must be a non-zero multiple of 1024, got {}",
                stream.buffer_size
            )));
        }

        if stream.num_buffers == 0 {
            return Err(AppError::config("Number of buffers must be greater than 0"));
        }

        if stream.num_transfers == 0 || stream.num_transfers >= stream.num_buffers {
            return Err(AppError::config(format!(
                "Number of transfers must be between 1 and {} (one less than the buffer count), got {}",
                stream.num_buffers.saturating_sub(1),
                stream.num_transfers
            )));
        }

        if stream.timeout_ms == 0 {
            return Err(AppError::config("Timeout must be greater than 0 ms"));
        }

        for case in &self.cases {
            if case.gap == 0 {
                return Err(AppError::validation(format!("Test case {} reads zero samples", case)));
            }
            if case.gap > stream.buffer_size as u64 {
                return Err(AppError::validation(format!(
                    "Test case {} reads more samples than the buffer size ({})",
                    case, stream.buffer_size
                )));
            }
        }

        if self.timestamp_step == 0 {
            return Err(AppError::config("Timestamp step must be at least 1 tick per sample"));
        }

        if self.sim_ticks_per_sample == 0 {
            return Err(AppError::config("Simulator ticks per sample must be at least 1"));
        }

        if self.backend != Backend::Sim && !self.sim_faults.is_empty() {
            return Err(AppError::config("Simulator faults require the sim backend"));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(backend) = std::env::var("RXGAP_BACKEND") {
            self.backend = backend.parse()?;
        }

        if let Ok(device) = std::env::var("RXGAP_DEVICE") {
            let device = device.trim();
            self.device = if device.is_empty() { None } else { Some(device.to_string()) };
        }

        if let Ok(cases) = std::env::var("RXGAP_CASES") {
            self.cases = TestCase::parse_list(&cases)?;
        }

        if let Ok(value) = std::env::var("RXGAP_NUM_BUFFERS") {
            self.stream.num_buffers = parse_env("RXGAP_NUM_BUFFERS", &value)?;
        }

        if let Ok(value) = std::env::var("RXGAP_BUFFER_SIZE") {
            self.stream.buffer_size = parse_env("RXGAP_BUFFER_SIZE", &value)?;
        }

        if let Ok(value) = std::env::var("RXGAP_NUM_TRANSFERS") {
            self.stream.num_transfers = parse_env("RXGAP_NUM_TRANSFERS", &value)?;
        }

        if let Ok(value) = std::env::var("RXGAP_TIMEOUT_MS") {
            self.stream.timeout_ms = parse_env("RXGAP_TIMEOUT_MS", &value)?;
        }

        if let Ok(value) = std::env::var("RXGAP_TIMESTAMP_STEP") {
            self.timestamp_step = parse_env("RXGAP_TIMESTAMP_STEP", &value)?;
            // the simulator follows the step; only --sim-ticks-per-sample sets it apart
            self.sim_ticks_per_sample = self.timestamp_step;
        }

        if let Ok(faults) = std::env::var("RXGAP_SIM_FAULTS") {
            self.sim_faults = faults
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::parse)
                .collect::<Result<Vec<Fault>>>()?;
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = enable_color.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        Ok(())
    }

    /// Total loop reads across all cases
    pub fn total_iterations(&self) -> u64 {
        self.cases.iter().map(|c| c.iterations as u64).sum()
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>()
        .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))
}

// Default value functions for serde
fn default_backend() -> Backend {
    Backend::Sim
}

fn default_timestamp_step() -> u64 {
    crate::defaults::TIMESTAMP_STEP
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}

fn default_sim_start() -> u64 {
    crate::defaults::SIM_START_TIMESTAMP
}

fn default_sim_ticks() -> u64 {
    crate::defaults::SIM_TICKS_PER_SAMPLE
}
