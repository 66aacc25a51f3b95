//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::{EnvManager, ENV_FILE},
    error::{AppError, Result},
    models::Config,
};
use std::path::Path;

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        self.cli.validate().map_err(AppError::config)?;

        let mut config = Config::default();

        // dotenv never overrides variables that are already set, so
        // loading the file first keeps the process environment on top
        if let Some(problems) = EnvManager::check_env_file(Path::new(ENV_FILE))? {
            for problem in problems {
                eprintln!("Warning: {} {}", ENV_FILE, problem);
            }
        }
        EnvManager::load_env_file(self.cli.debug)?;
        config.merge_from_env()?;

        self.apply_cli_overrides(&mut config);

        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        let cli = &self.cli;

        if let Some(backend) = cli.backend {
            config.backend = backend;
        }
        if let Some(ref device) = cli.device {
            config.device = Some(device.clone());
        }
        if let Some(cases) = cli.selected_cases() {
            config.cases = cases;
        }

        if let Some(n) = cli.num_buffers {
            config.stream.num_buffers = n;
        }
        if let Some(n) = cli.buffer_size {
            config.stream.buffer_size = n;
        }
        if let Some(n) = cli.num_transfers {
            config.stream.num_transfers = n;
        }
        if let Some(ms) = cli.timeout_ms {
            config.stream.timeout_ms = ms;
        }
        if let Some(step) = cli.timestamp_step {
            config.timestamp_step = step;
        }

        if let Some(start) = cli.sim_start {
            config.sim_start_timestamp = start;
        }
        if let Some(ticks) = cli.sim_ticks_per_sample {
            config.sim_ticks_per_sample = ticks;
        } else if cli.timestamp_step.is_some() {
            // A simulator that matches the requested step by default
            config.sim_ticks_per_sample = config.timestamp_step;
        }
        if !cli.sim_faults.is_empty() {
            config.sim_faults = cli.sim_faults.clone();
        }

        if cli.color {
            config.enable_color = true;
        } else if cli.no_color {
            config.enable_color = false;
        }

        config.keep_going = cli.keep_going;
        config.json_output = cli.json;
        config.verbose = cli.verbose;
        config.debug = cli.debug;

        if config.debug {
            eprintln!("Applied CLI overrides to configuration");
            eprintln!("{}", display_config_summary(config));
        }
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let cases: Vec<String> = config.cases.iter().map(|c| c.to_string()).collect();
    let mut summary = vec![
        format!("Backend: {}", config.backend),
        format!("Device: {}", config.device.as_deref().unwrap_or("(first available)")),
        format!("Cases: {}", cases.join(", ")),
        format!(
            "Stream: {} buffers x {} samples, {} transfers, {} ms timeout",
            config.stream.num_buffers, config.stream.buffer_size, config.stream.num_transfers, config.stream.timeout_ms
        ),
        format!("Timestamp step: {} ticks/sample", config.timestamp_step),
        format!("Keep going: {}", config.keep_going),
        format!("Color Output: {}", config.enable_color),
        format!("Verbose: {}", config.verbose),
        format!("Debug: {}", config.debug),
    ];

    if config.backend == crate::types::Backend::Sim {
        summary.push(format!(
            "Simulator: start=0x{:x}, {} ticks/sample, {} fault(s)",
            config.sim_start_timestamp,
            config.sim_ticks_per_sample,
            config.sim_faults.len()
        ));
    }

    summary.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{device::Fault, models::TestCase, types::Backend};
    use clap::Parser;
    use std::env;
    use std::sync::Mutex;

    // Tests below touch process-wide environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "RXGAP_BACKEND",
        "RXGAP_DEVICE",
        "RXGAP_CASES",
        "RXGAP_NUM_BUFFERS",
        "RXGAP_BUFFER_SIZE",
        "RXGAP_NUM_TRANSFERS",
        "RXGAP_TIMEOUT_MS",
        "RXGAP_TIMESTAMP_STEP",
        "RXGAP_SIM_FAULTS",
        "ENABLE_COLOR",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn parse(args: &[&str]) -> Result<Config> {
        let mut argv = vec!["rxgap"];
        argv.extend_from_slice(args);
        ConfigParser::new(Cli::parse_from(argv)).parse()
    }

    #[test]
    fn test_cli_overrides() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let config = parse(&[
            "--case", "2048:5",
            "--buffer-size", "4096",
            "--timeout-ms", "250",
            "--keep-going",
            "--no-color",
            "--json",
        ])
        .unwrap();

        assert_eq!(config.cases, vec![TestCase::new(2048, 5)]);
        assert_eq!(config.stream.buffer_size, 4096);
        assert_eq!(config.stream.timeout_ms, 250);
        assert!(config.keep_going);
        assert!(config.json_output);
        assert!(!config.enable_color);
    }

    #[test]
    fn test_env_then_cli_priority() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        env::set_var("RXGAP_CASES", "8:2,16:4");
        env::set_var("RXGAP_TIMEOUT_MS", "500");

        let config = parse(&[]).unwrap();
        assert_eq!(config.cases, vec![TestCase::new(8, 2), TestCase::new(16, 4)]);
        assert_eq!(config.stream.timeout_ms, 500);

        let config = parse(&["--case", "32:1", "--timeout-ms", "750"]).unwrap();
        assert_eq!(config.cases, vec![TestCase::new(32, 1)]);
        assert_eq!(config.stream.timeout_ms, 750);

        clear_env();
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        env::set_var("RXGAP_NUM_BUFFERS", "many");
        let err = parse(&[]).unwrap_err();
        assert_eq!(err.category(), "CONFIG");
        assert!(err.to_string().contains("RXGAP_NUM_BUFFERS"));

        clear_env();
    }

    #[test]
    fn test_gap_over_buffer_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let err = parse(&["--buffer-size", "1024", "--case", "1025:1"]).unwrap_err();
        assert_eq!(err.category(), "VALIDATION");
    }

    #[test]
    fn test_timestamp_step_carries_to_simulator() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let config = parse(&["--timestamp-step", "1"]).unwrap();
        assert_eq!(config.timestamp_step, 1);
        assert_eq!(config.sim_ticks_per_sample, 1);

        let config = parse(&["--timestamp-step", "1", "--sim-ticks-per-sample", "3"]).unwrap();
        assert_eq!(config.sim_ticks_per_sample, 3);
    }

    #[test]
    fn test_timestamp_step_from_env_carries_to_simulator() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        env::set_var("RXGAP_TIMESTAMP_STEP", "1");
        let config = parse(&[]).unwrap();
        assert_eq!(config.timestamp_step, 1);
        assert_eq!(config.sim_ticks_per_sample, 1);

        let config = parse(&["--sim-ticks-per-sample", "4"]).unwrap();
        assert_eq!(config.timestamp_step, 1);
        assert_eq!(config.sim_ticks_per_sample, 4);

        clear_env();
    }

    #[test]
    fn test_sim_faults_from_cli() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let config = parse(&["--sim-fault", "overrun:3", "--backend", "sim"]).unwrap();
        assert_eq!(config.backend, Backend::Sim);
        assert_eq!(config.sim_faults, vec![Fault::Overrun { read: 3 }]);
    }

    #[test]
    fn test_config_summary() {
        let summary = display_config_summary(&Config::default());
        assert!(summary.contains("Backend: sim"));
        assert!(summary.contains("Cases: 1023:10000, 1024:10000, 1025:10000"));
        assert!(summary.contains("16 buffers x 65536 samples, 8 transfers, 1000 ms timeout"));
        assert!(summary.contains("Simulator: start=0x1000"));
    }
}
