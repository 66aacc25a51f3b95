//! Test execution engine
//!
//! `GapTestRunner` drives one device through the case table. Each case
//! configures the sync interface, enables RX, performs an initial read
//! and then `iterations` further reads, predicting every timestamp from
//! the previous one. RX is disabled again however the case ends.
//!
//! Failure scope:
//! - a failed read or enable abandons the case; the run moves on
//! - a failed sync configuration or disable stops the run

use crate::{
    defaults,
    device::{DeviceError, RxDevice, RxMetadata},
    error::{AppError, ErrorContext, Result},
    logging::{DeviceLogger, Logger},
    models::{Anomaly, CaseOutcome, CaseResult, Config, RunReport, StreamParams, TestCase},
    output::ProgressReporter,
    stats::RunSummary,
    types::Backend,
};
use chrono::Utc;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Instant;
use uuid::Uuid;

/// Runs timestamp continuity cases against an RX device
pub struct GapTestRunner<D: RxDevice> {
    device: D,
    backend: Backend,
    stream: StreamParams,
    timestamp_step: u64,
    keep_going: bool,
    run_id: String,
    stop: Arc<AtomicBool>,
    last_fatal: Option<AppError>,
    logger: Logger,
    device_logger: DeviceLogger,
}

/// How a case ended, plus the error that must stop the run, if any
struct CaseRun {
    result: Option<CaseResult>,
    fatal: Option<AppError>,
}

impl<D: RxDevice> GapTestRunner<D> {
    pub fn new(device: D, config: &Config, logger: Logger) -> Self {
        let device_logger = DeviceLogger::new(&logger);
        Self {
            device,
            backend: config.backend,
            stream: config.stream.clone(),
            timestamp_step: config.timestamp_step,
            keep_going: config.keep_going,
            run_id: logger.session_id().unwrap_or_else(|| Uuid::new_v4().to_string()),
            stop: Arc::new(AtomicBool::new(false)),
            last_fatal: None,
            logger: logger.named("RUN"),
            device_logger,
        }
    }

    /// Share an externally owned stop flag (set from a Ctrl-C handler)
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }

    /// The error that stopped the last `run_all`, if any
    pub fn take_fatal_error(&mut self) -> Option<AppError> {
        self.last_fatal.take()
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Run a single case with a caller-provided sample buffer
    ///
    /// Returns an error when the run as a whole cannot continue. A case
    /// that merely fails or aborts is reported through its outcome.
    pub fn run_case(
        &mut self,
        case: &TestCase,
        samples: &mut [i16],
        progress: &mut dyn ProgressReporter,
    ) -> Result<CaseResult> {
        let run = self.execute_case(case, samples, progress);
        match (run.result, run.fatal) {
            (_, Some(error)) => Err(error),
            (Some(result), None) => Ok(result),
            (None, None) => Err(AppError::internal("case finished without a result")),
        }
    }

    /// Run every case in order, stopping at a fatal error or an interrupt
    pub fn run_all(&mut self, cases: &[TestCase], progress: &mut dyn ProgressReporter) -> RunReport {
        let started_at = Utc::now();
        let mut samples = vec![0i16; self.stream.sample_buffer_len()];
        let mut results = Vec::with_capacity(cases.len());
        let mut fatal_error = None;
        let mut stopped_early = false;
        self.last_fatal = None;

        self.logger.info(&format!("Running {} test case(s)", cases.len()))
            .field("device", self.device.describe())
            .field("keep_going", self.keep_going)
            .log();

        for case in cases {
            if self.stopped() {
                self.logger.warn("Run interrupted before all cases ran")
                    .case(case)
                    .log();
                stopped_early = true;
                break;
            }

            let run = self.execute_case(case, &mut samples, progress);
            let interrupted = run.result.as_ref().map_or(false, |r| r.outcome == CaseOutcome::Interrupted);
            results.extend(run.result);

            if let Some(error) = run.fatal {
                self.logger.error(&format!("Run stopped: {}", error))
                    .case(case)
                    .error_info(&error)
                    .log();
                fatal_error = Some(error.to_string());
                self.last_fatal = Some(error);
                break;
            }
            if interrupted {
                stopped_early = true;
                break;
            }
        }

        let summary = RunSummary::from_cases(&results);
        self.logger.info("Run finished")
            .field("passed", summary.passed)
            .field("failed", summary.failed)
            .field("aborted", summary.aborted)
            .log();

        RunReport {
            run_id: self.run_id.clone(),
            started_at,
            finished_at: Utc::now(),
            backend: self.backend,
            device: self.device.describe(),
            stream: self.stream.clone(),
            timestamp_step: self.timestamp_step,
            keep_going: self.keep_going,
            cases: results,
            summary,
            fatal_error,
            stopped_early,
        }
    }

    fn execute_case(
        &mut self,
        case: &TestCase,
        samples: &mut [i16],
        progress: &mut dyn ProgressReporter,
    ) -> CaseRun {
        let started = Instant::now();

        if case.gap == 0 || case.gap > u64::from(self.stream.buffer_size) {
            return CaseRun {
                result: None,
                fatal: Some(AppError::validation(format!(
                    "Read size {} must be between 1 and the buffer size ({})",
                    case.gap, self.stream.buffer_size
                ))),
            };
        }
        let required = case.gap as usize * 2;
        if samples.len() < required {
            return CaseRun {
                result: None,
                fatal: Some(AppError::internal(format!(
                    "Sample buffer holds {} values, {} needed",
                    samples.len(),
                    required
                ))),
            };
        }

        let configured = self.device.sync_config(&self.stream);
        self.device_logger.log_sync_config(&self.stream, configured.as_ref().map(|_| ()));
        if let Err(e) = configured {
            progress.device_error("Failed to configure RX sync i/f", &e);
            return CaseRun {
                result: None,
                fatal: Err::<(), _>(e).context("Failed to configure RX sync i/f").err(),
            };
        }

        let mut result = CaseResult::new(*case);
        let outcome = self.stream_case(case, samples, &mut result, progress);
        result.outcome = outcome;
        result.duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        progress.case_finished(&result);

        self.logger.info(&format!("Test case {}", result.outcome.label()))
            .case(case)
            .field("reads", result.reads_completed)
            .field("mismatches", result.mismatch_count)
            .field("status_warnings", result.status_count)
            .field("duration_ms", result.duration_ms)
            .log();

        let disabled = self.device.enable_rx(false);
        self.device_logger.log_enable(false, disabled.as_ref().map(|_| ()));
        let fatal = match disabled {
            Ok(()) => None,
            Err(e) => {
                progress.device_error("Failed to disable RX module", &e);
                Err::<(), _>(e).context("Failed to disable RX module").err()
            }
        };

        CaseRun { result: Some(result), fatal }
    }

    /// Enable RX and perform the reads of one case
    fn stream_case(
        &mut self,
        case: &TestCase,
        samples: &mut [i16],
        result: &mut CaseResult,
        progress: &mut dyn ProgressReporter,
    ) -> CaseOutcome {
        let enabled = self.device.enable_rx(true);
        self.device_logger.log_enable(true, enabled.as_ref().map(|_| ()));
        if let Err(e) = enabled {
            progress.device_error("Failed to enable RX module", &e);
            return aborted("Failed to enable RX module", &e);
        }

        progress.case_started(case);

        let num_samples = case.gap as usize;
        let timeout_ms = self.stream.timeout_ms;
        let mut meta = RxMetadata::cleared();

        if let Err(e) = self.device.sync_rx(samples, num_samples, &mut meta, timeout_ms) {
            self.device_logger.log_read_failure(None, &e);
            progress.device_error("Initial RX failed", &e);
            return aborted("Initial RX failed", &e);
        }

        result.initial_timestamp = Some(meta.timestamp);
        result.initial_status = Some(meta.status);
        progress.initial_read(case, &meta);

        let step = case.expected_step(self.timestamp_step);
        let mut pass = true;

        for i in 0..case.iterations {
            if !pass && !self.keep_going {
                break;
            }
            if self.stopped() {
                self.logger.warn("Interrupted").case(case).field("iteration", i).log();
                return CaseOutcome::Interrupted;
            }

            let previous = meta.timestamp;
            let expected = previous.wrapping_add(step);
            meta.timestamp = 0;

            if let Err(e) = self.device.sync_rx(samples, num_samples, &mut meta, timeout_ms) {
                self.device_logger.log_read_failure(Some(i), &e);
                progress.device_error(&format!("RX {} failed", i), &e);
                return aborted(&format!("RX {} failed", i), &e);
            }

            result.reads_completed += 1;
            result.step_stats.add_timestamps(previous, meta.timestamp);

            if meta.timestamp != expected {
                pass = false;
                result.mismatch_count += 1;
                self.record(case, result, Anomaly::mismatch(i, expected, meta.timestamp), progress);
            }

            if meta.status != 0 {
                pass = false;
                result.status_count += 1;
                self.record(case, result, Anomaly::status(i, meta.status), progress);
            }
        }

        if pass {
            CaseOutcome::Passed
        } else {
            CaseOutcome::Failed
        }
    }

    fn record(&self, case: &TestCase, result: &mut CaseResult, anomaly: Anomaly, progress: &mut dyn ProgressReporter) {
        self.logger.debug("Anomaly")
            .case(case)
            .field("anomaly", &anomaly)
            .log();
        progress.anomaly(case, &anomaly);
        if result.anomalies.len() < defaults::MAX_RECORDED_ANOMALIES {
            result.anomalies.push(anomaly);
        }
    }
}

fn aborted(context: &str, error: &DeviceError) -> CaseOutcome {
    CaseOutcome::Aborted { error: format!("{}: {}", context, error) }
}
