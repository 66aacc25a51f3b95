//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Device backends the tester can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-process simulated receiver
    Sim,
    /// Hardware through libbladeRF
    Bladerf,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Sim => "sim",
            Backend::Bladerf => "bladerf",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sim" | "simulated" => Ok(Backend::Sim),
            "bladerf" | "hw" => Ok(Backend::Bladerf),
            other => Err(AppError::parse(format!("Unknown backend '{}' (expected sim or bladerf)", other))),
        }
    }
}
