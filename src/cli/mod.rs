//! Command-line interface

use crate::{device::Fault, models::TestCase, types::Backend};
use clap::{ArgAction, Parser};

/// RX Gap Tester - checks that RX sample timestamps advance without gaps
#[derive(Parser, Debug, Clone)]
#[command(name = "rxgap")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Device backend to drive
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Driver device identifier (e.g. "*:serial=f12ce1")
    #[arg(short, long)]
    pub device: Option<String>,

    /// Test case as READ_SIZE:ITERATIONS (can be used multiple times)
    #[arg(short = 'c', long = "case", value_name = "GAP:ITER", action = ArgAction::Append)]
    pub cases: Vec<TestCase>,

    /// Run the long soak case table
    #[arg(long, conflicts_with = "cases")]
    pub extended: bool,

    /// Number of sync interface buffers
    #[arg(long, value_name = "N")]
    pub num_buffers: Option<u32>,

    /// Samples per buffer (multiple of 1024)
    #[arg(long, value_name = "SAMPLES")]
    pub buffer_size: Option<u32>,

    /// Number of in-flight transfers
    #[arg(long, value_name = "N")]
    pub num_transfers: Option<u32>,

    /// Stream and read timeout in milliseconds
    #[arg(short, long, value_name = "MS")]
    pub timeout_ms: Option<u32>,

    /// Timestamp ticks per sample
    #[arg(long, value_name = "TICKS")]
    pub timestamp_step: Option<u64>,

    /// Keep reading after the first anomaly of a case
    #[arg(short, long)]
    pub keep_going: bool,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,

    /// Force colored output
    #[arg(long, conflicts_with = "no_color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Simulator: timestamp of the first sample (decimal or 0x hex)
    #[arg(long, value_name = "TICKS", value_parser = parse_ticks)]
    pub sim_start: Option<u64>,

    /// Simulator: clock ticks per delivered sample
    #[arg(long, value_name = "TICKS")]
    pub sim_ticks_per_sample: Option<u64>,

    /// Simulator fault: drop:READ:N, repeat:READ:N, overrun:READ or error:READ:CODE
    #[arg(long = "sim-fault", value_name = "FAULT", action = ArgAction::Append)]
    pub sim_faults: Vec<Fault>,

    /// Print the supported environment variables and exit
    #[arg(long)]
    pub env_help: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts clap cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.backend == Some(Backend::Bladerf) {
            if !self.sim_faults.is_empty() {
                return Err("--sim-fault requires the sim backend".to_string());
            }
            if self.sim_start.is_some() || self.sim_ticks_per_sample.is_some() {
                return Err("Simulator options require the sim backend".to_string());
            }
        }

        if self.sim_ticks_per_sample == Some(0) {
            return Err("--sim-ticks-per-sample must be at least 1".to_string());
        }

        Ok(())
    }

    /// Case list selected on the command line, if any
    pub fn selected_cases(&self) -> Option<Vec<TestCase>> {
        if self.extended {
            Some(TestCase::extended_cases())
        } else if !self.cases.is_empty() {
            Some(self.cases.clone())
        } else {
            None
        }
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color {
            false
        } else {
            supports_color()
        }
    }
}

/// Parse a tick count in decimal or `0x` hexadecimal
fn parse_ticks(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };
    parsed.map_err(|_| format!("Invalid tick count: {}", s))
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    cfg!(unix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceErrorKind;

    #[test]
    fn test_cli_parsing_basic() {
        let cli = Cli::parse_from(["rxgap"]);
        assert_eq!(cli.backend, None);
        assert!(cli.cases.is_empty());
        assert_eq!(cli.selected_cases(), None);
        assert!(!cli.keep_going);
        assert!(!cli.json);
    }

    #[test]
    fn test_cli_parsing_all_options() {
        let cli = Cli::parse_from([
            "rxgap",
            "--backend", "sim",
            "--device", "*:serial=f12ce1",
            "--case", "1024:10",
            "--case", "8:3",
            "--num-buffers", "32",
            "--buffer-size", "4096",
            "--num-transfers", "16",
            "--timeout-ms", "2500",
            "--timestamp-step", "1",
            "--keep-going",
            "--json",
            "--no-color",
            "--verbose",
            "--debug",
            "--sim-start", "0x10",
            "--sim-ticks-per-sample", "1",
            "--sim-fault", "drop:2:16",
            "--sim-fault", "error:1:timeout",
        ]);

        assert_eq!(cli.backend, Some(Backend::Sim));
        assert_eq!(cli.device.as_deref(), Some("*:serial=f12ce1"));
        assert_eq!(cli.cases, vec![TestCase::new(1024, 10), TestCase::new(8, 3)]);
        assert_eq!(cli.num_buffers, Some(32));
        assert_eq!(cli.buffer_size, Some(4096));
        assert_eq!(cli.num_transfers, Some(16));
        assert_eq!(cli.timeout_ms, Some(2500));
        assert_eq!(cli.timestamp_step, Some(1));
        assert!(cli.keep_going && cli.json && cli.no_color && cli.verbose && cli.debug);
        assert_eq!(cli.sim_start, Some(16));
        assert_eq!(cli.sim_ticks_per_sample, Some(1));
        assert_eq!(
            cli.sim_faults,
            vec![
                Fault::Drop { read: 2, samples: 16 },
                Fault::Error { read: 1, kind: DeviceErrorKind::Timeout },
            ]
        );
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Cli::try_parse_from(["rxgap", "--case", "1024"]).is_err());
        assert!(Cli::try_parse_from(["rxgap", "--case", "0:10"]).is_err());
        assert!(Cli::try_parse_from(["rxgap", "--backend", "usrp"]).is_err());
        assert!(Cli::try_parse_from(["rxgap", "--sim-fault", "melt:1"]).is_err());
        assert!(Cli::try_parse_from(["rxgap", "--sim-start", "0xZZ"]).is_err());
        assert!(Cli::try_parse_from(["rxgap", "--color", "--no-color"]).is_err());
        assert!(Cli::try_parse_from(["rxgap", "--extended", "--case", "8:1"]).is_err());
    }

    #[test]
    fn test_selected_cases() {
        let cli = Cli::parse_from(["rxgap", "--extended"]);
        assert_eq!(cli.selected_cases(), Some(TestCase::extended_cases()));

        let cli = Cli::parse_from(["rxgap", "-c", "5:5"]);
        assert_eq!(cli.selected_cases(), Some(vec![TestCase::new(5, 5)]));
    }

    #[test]
    fn test_simulator_options_need_sim_backend() {
        let cli = Cli::parse_from(["rxgap", "--backend", "bladerf", "--sim-fault", "overrun:1"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["rxgap", "--backend", "bladerf", "--sim-start", "5"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["rxgap", "--sim-ticks-per-sample", "0"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_use_colors_method() {
        assert!(Cli::parse_from(["rxgap", "--color"]).use_colors());
        assert!(!Cli::parse_from(["rxgap", "--no-color"]).use_colors());
    }

    #[test]
    fn test_parse_ticks() {
        assert_eq!(parse_ticks("4096"), Ok(4096));
        assert_eq!(parse_ticks("0x1000"), Ok(4096));
        assert_eq!(parse_ticks("0XfF"), Ok(255));
        assert!(parse_ticks("-1").is_err());
        assert!(parse_ticks("").is_err());
    }
}
