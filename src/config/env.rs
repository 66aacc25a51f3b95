//! Environment variable handling and .env file management

use crate::{
    device::Fault,
    error::{AppError, Result},
    models::TestCase,
    types::Backend,
};
use std::path::Path;

/// Env file read from the working directory
pub const ENV_FILE: &str = ".env";

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists
    ///
    /// Variables already set in the process environment win over the file.
    pub fn load_env_file(debug: bool) -> Result<()> {
        Self::load_env_file_from(Path::new(ENV_FILE), debug)
    }

    /// Load a specific env file if it exists
    pub fn load_env_file_from(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path)
                .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;

            if debug {
                eprintln!("Loaded configuration from {}", path.display());
            }
        } else if debug {
            eprintln!("No .env file found, using defaults and CLI arguments");
        }

        Ok(())
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "RXGAP_BACKEND" => {
                value.parse::<Backend>()?;
            }
            "RXGAP_DEVICE" => {}
            "RXGAP_CASES" => {
                TestCase::parse_list(value)?;
            }
            "RXGAP_NUM_BUFFERS" | "RXGAP_NUM_TRANSFERS" | "RXGAP_TIMEOUT_MS" => {
                let n: u32 = value.parse()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
                if n == 0 {
                    return Err(AppError::config(format!("{} must be greater than 0", key)));
                }
            }
            "RXGAP_BUFFER_SIZE" => {
                let size: u32 = value.parse()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
                if size == 0 || size % 1024 != 0 {
                    return Err(AppError::config(format!(
                        "RXGAP_BUFFER_SIZE must be a non-zero multiple of 1024, got: {}",
                        size
                    )));
                }
            }
            "RXGAP_TIMESTAMP_STEP" => {
                let step: u64 = value.parse()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
                if step == 0 {
                    return Err(AppError::config("RXGAP_TIMESTAMP_STEP must be at least 1"));
                }
            }
            "RXGAP_SIM_FAULTS" => {
                for fault in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    fault.parse::<Fault>()?;
                }
            }
            "ENABLE_COLOR" => {
                value.parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", value, e)))?;
            }
            _ => {}
        }

        Ok(())
    }

    /// Supported environment variables as (name, description, example)
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("RXGAP_BACKEND", "Device backend (sim, bladerf)", "sim"),
            ("RXGAP_DEVICE", "Driver device identifier", "*:serial=f12ce1"),
            ("RXGAP_CASES", "Comma-separated GAP:ITERATIONS pairs", "1024:10000,2048:5000"),
            ("RXGAP_NUM_BUFFERS", "Number of sync interface buffers", "16"),
            ("RXGAP_BUFFER_SIZE", "Samples per buffer (multiple of 1024)", "65536"),
            ("RXGAP_NUM_TRANSFERS", "In-flight transfers (less than buffers)", "8"),
            ("RXGAP_TIMEOUT_MS", "Stream and read timeout in milliseconds", "1000"),
            ("RXGAP_TIMESTAMP_STEP", "Timestamp ticks per sample", "2"),
            ("RXGAP_SIM_FAULTS", "Simulator faults (comma-separated)", "drop:5:16,overrun:9"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<22} {}\n", var, description));
            help.push_str(&format!("  {:<22} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate the lines of an env file without loading it
    pub fn check_env_file(path: &Path) -> Result<Option<Vec<String>>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::io(format!("Failed to read {}: {}", path.display(), e)))?;

        let mut warnings = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                if let Err(e) = Self::validate_env_var(key.trim(), value) {
                    warnings.push(format!("Line '{}': {}", line, e));
                }
            }
        }

        Ok(Some(warnings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_validate_env_var() {
        assert!(EnvManager::validate_env_var("RXGAP_BACKEND", "sim").is_ok());
        assert!(EnvManager::validate_env_var("RXGAP_CASES", "1024:10, 8:2").is_ok());
        assert!(EnvManager::validate_env_var("RXGAP_BUFFER_SIZE", "4096").is_ok());
        assert!(EnvManager::validate_env_var("RXGAP_TIMESTAMP_STEP", "1").is_ok());
        assert!(EnvManager::validate_env_var("RXGAP_SIM_FAULTS", "drop:3:16,overrun:4").is_ok());
        assert!(EnvManager::validate_env_var("ENABLE_COLOR", "false").is_ok());
        assert!(EnvManager::validate_env_var("SOMETHING_ELSE", "whatever").is_ok());

        assert!(EnvManager::validate_env_var("RXGAP_BACKEND", "usrp").is_err());
        assert!(EnvManager::validate_env_var("RXGAP_CASES", "1024").is_err());
        assert!(EnvManager::validate_env_var("RXGAP_BUFFER_SIZE", "1000").is_err());
        assert!(EnvManager::validate_env_var("RXGAP_NUM_BUFFERS", "0").is_err());
        assert!(EnvManager::validate_env_var("RXGAP_TIMEOUT_MS", "soon").is_err());
        assert!(EnvManager::validate_env_var("RXGAP_TIMESTAMP_STEP", "0").is_err());
        assert!(EnvManager::validate_env_var("RXGAP_SIM_FAULTS", "explode:1").is_err());
        assert!(EnvManager::validate_env_var("ENABLE_COLOR", "maybe").is_err());
    }

    #[test]
    fn test_display_env_help() {
        let help = EnvManager::display_env_help();
        assert!(help.contains("Supported Environment Variables:"));
        assert!(help.contains("RXGAP_CASES"));
        assert!(help.contains("Configuration Priority"));
    }

    #[test]
    fn test_check_env_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "RXGAP_BUFFER_SIZE=4096").unwrap();
        writeln!(file, "RXGAP_TIMESTAMP_STEP=zero").unwrap();

        let warnings = EnvManager::check_env_file(file.path()).unwrap().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("RXGAP_TIMESTAMP_STEP=zero"));

        let missing = file.path().with_extension("missing");
        assert!(EnvManager::check_env_file(&missing).unwrap().is_none());
    }
}
