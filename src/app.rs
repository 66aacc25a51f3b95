//! Main application orchestration and execution

use crate::{
    cli::Cli,
    config::{display_config_summary, load_config, validate_config, EnvManager},
    device::{open_device, RxDevice},
    error::{AppError, Result},
    executor::GapTestRunner,
    logging::LoggerFactory,
    models::{Config, RunReport},
    output::{OutputCoordinator, OutputFormatterFactory},
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Main application struct that coordinates all components
pub struct App {
    cli: Cli,
    use_color: bool,
}

impl App {
    /// Create a new application instance with CLI configuration
    pub fn new(cli: Cli) -> Result<Self> {
        let use_color = cli.use_colors();
        Ok(Self { cli, use_color })
    }

    /// Color setting for final error output
    ///
    /// Follows the loaded configuration once it exists, the CLI flags before.
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Run the application
    pub async fn run(&mut self) -> Result<()> {
        if self.cli.env_help {
            println!("{}", EnvManager::display_env_help());
            return Ok(());
        }

        let config = load_config(self.cli.clone())?;
        self.use_color = config.enable_color;

        let warnings = validate_config(&config)?;
        for warning in &warnings {
            eprintln!("{}", warning.format(config.enable_color));
        }
        if config.debug {
            eprintln!("{}", display_config_summary(&config));
        }

        let loggers = LoggerFactory::new(&config);
        let device = open_device(&config)?;
        loggers.create_device_logger().log_opened(&device.describe());

        let stop = Arc::new(AtomicBool::new(false));
        let interrupt = tokio::spawn(watch_interrupt(stop.clone()));

        let run_config = config.clone();
        let logger = loggers.create_logger("APP");
        let (report, fatal) = tokio::task::spawn_blocking(move || {
            let mut progress =
                OutputFormatterFactory::create_progress(run_config.json_output, run_config.enable_color);
            let mut runner = GapTestRunner::new(device, &run_config, logger).with_stop_flag(stop);
            let report = runner.run_all(&run_config.cases, progress.as_mut());
            (report, runner.take_fatal_error())
        })
        .await?;

        interrupt.abort();

        let coordinator = OutputCoordinator::new(OutputFormatterFactory::create_formatter(
            config.enable_color,
            config.verbose,
        ))
        .json(config.json_output);
        println!("{}", coordinator.display_report(&report)?);

        verdict(&config, &report, fatal)
    }
}

/// Set the stop flag on the first Ctrl-C
async fn watch_interrupt(stop: Arc<AtomicBool>) {
    if tokio::signal::ctrl_c().await.is_ok() {
        eprintln!("\nInterrupt received, stopping after the current read...");
        stop.store(true, Ordering::SeqCst);
    }
}

/// Map the finished run onto the process result
fn verdict(config: &Config, report: &RunReport, fatal: Option<AppError>) -> Result<()> {
    if let Some(error) = fatal {
        return Err(error);
    }
    if let Some(message) = &report.fatal_error {
        return Err(AppError::internal(message.clone()));
    }
    if report.interrupted() {
        return Err(AppError::interrupted("Run interrupted by user"));
    }
    if !report.passed() {
        let summary = &report.summary;
        return Err(AppError::test_failure(format!(
            "{} of {} test case(s) did not pass",
            summary.total_cases - summary.passed,
            summary.total_cases
        )));
    }
    if config.verbose {
        eprintln!("Run {} finished", report.run_id);
    }
    Ok(())
}
