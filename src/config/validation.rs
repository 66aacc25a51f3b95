//! Soft configuration checks
//!
//! `Config::validate` rejects settings the driver cannot accept. The
//! checks here only produce warnings about settings that are legal but
//! probably not what the user meant.

use crate::{error::Result, models::Config, types::Backend};
use colored::Colorize;

/// Reads above this count are reported as a long run
const LONG_RUN_READS: u64 = 1_000_000;

/// Configuration validator producing warnings
pub struct ConfigValidator;

impl ConfigValidator {
    /// Run the hard checks, then collect warnings
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        config.validate()?;

        let mut warnings = Vec::new();
        warnings.extend(Self::check_run_length(config));
        warnings.extend(Self::check_read_sizes(config));
        warnings.extend(Self::check_stream(config));
        warnings.extend(Self::check_timestamps(config));
        Ok(warnings)
    }

    fn check_run_length(config: &Config) -> Vec<ValidationWarning> {
        let total = config.total_iterations();
        let mut warnings = Vec::new();

        if total > LONG_RUN_READS {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!("{} reads are scheduled; this run may take a long time", total),
            ));
        }

        if config.cases.iter().any(|c| c.iterations == 0) {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                "A case with 0 iterations only checks the initial read".to_string(),
            ));
        }

        warnings
    }

    fn check_read_sizes(config: &Config) -> Vec<ValidationWarning> {
        let buffer = u64::from(config.stream.buffer_size);
        let odd: Vec<String> = config
            .cases
            .iter()
            .filter(|c| c.gap % buffer != 0 && buffer % c.gap != 0)
            .map(|c| c.gap.to_string())
            .collect();

        if odd.is_empty() {
            Vec::new()
        } else {
            vec![ValidationWarning::new(
                ValidationLevel::Info,
                format!(
                    "Read sizes {} do not divide the buffer size ({}); reads will straddle buffers",
                    odd.join(", "),
                    buffer
                ),
            )]
        }
    }

    fn check_stream(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let stream = &config.stream;

        if stream.timeout_ms < 100 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!("Timeout of {} ms is short and may cause spurious read timeouts", stream.timeout_ms),
            ));
        }

        if stream.num_transfers * 2 > stream.num_buffers + 1 && stream.num_buffers > 2 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!(
                    "{} transfers over {} buffers leaves little headroom for the reader",
                    stream.num_transfers, stream.num_buffers
                ),
            ));
        }

        warnings
    }

    fn check_timestamps(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.timestamp_step != crate::defaults::TIMESTAMP_STEP {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Timestamp step is {} ticks per sample (default {})",
                    config.timestamp_step,
                    crate::defaults::TIMESTAMP_STEP
                ),
            ));
        }

        if config.backend == Backend::Sim && config.sim_ticks_per_sample != config.timestamp_step {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Simulator advances {} ticks per sample but {} are expected; every case will fail",
                    config.sim_ticks_per_sample, config.timestamp_step
                ),
            ));
        }

        warnings
    }
}

/// Severity of a configuration warning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationLevel {
    Info,
    Warning,
    Error,
}

impl ValidationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationLevel::Info => "INFO",
            ValidationLevel::Warning => "WARNING",
            ValidationLevel::Error => "ERROR",
        }
    }
}

/// A configuration warning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    pub fn format(&self, use_color: bool) -> String {
        let label = format!("[{}]", self.level.as_str());
        let label = if use_color {
            match self.level {
                ValidationLevel::Info => label.blue().to_string(),
                ValidationLevel::Warning => label.yellow().to_string(),
                ValidationLevel::Error => label.red().to_string(),
            }
        } else {
            label
        };
        format!("{} {}", label, self.message)
    }
}

/// Validate configuration and return warnings
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}
