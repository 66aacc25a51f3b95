//! Live per-case progress lines
//!
//! The runner reports events as they happen so long soak runs show
//! their state before the final report is rendered.

use crate::{
    device::{DeviceError, RxMetadata},
    models::{Anomaly, AnomalyKind, CaseOutcome, CaseResult, TestCase},
};
use colored::Colorize;
use std::io::{self, Write};

/// Receives test progress events from the runner
pub trait ProgressReporter {
    fn case_started(&mut self, _case: &TestCase) {}
    fn initial_read(&mut self, _case: &TestCase, _meta: &RxMetadata) {}
    fn anomaly(&mut self, _case: &TestCase, _anomaly: &Anomaly) {}
    fn device_error(&mut self, _context: &str, _error: &DeviceError) {}
    fn case_finished(&mut self, _result: &CaseResult) {}
}

/// Reporter that discards every event
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {}

/// Console reporter: progress on `out`, problems on `err`
pub struct ConsoleProgress<O: Write, E: Write> {
    out: O,
    err: E,
    use_color: bool,
}

impl ConsoleProgress<io::Stdout, io::Stderr> {
    pub fn stdio(use_color: bool) -> Self {
        Self::with_writers(io::stdout(), io::stderr(), use_color)
    }
}

impl<O: Write, E: Write> ConsoleProgress<O, E> {
    pub fn with_writers(out: O, err: E, use_color: bool) -> Self {
        Self { out, err, use_color }
    }

    pub fn into_writers(self) -> (O, E) {
        (self.out, self.err)
    }

    fn problem(&mut self, line: String) {
        let line = if self.use_color { line.red().to_string() } else { line };
        let _ = writeln!(self.err, "{}", line);
    }
}

impl<O: Write, E: Write> ProgressReporter for ConsoleProgress<O, E> {
    fn case_started(&mut self, case: &TestCase) {
        let title = format!("Test Case: Read size={} samples, {} iterations", case.gap, case.iterations);
        let title = if self.use_color { title.bold().to_string() } else { title };
        let _ = writeln!(self.out, "\n{}", title);
        let _ = writeln!(self.out, "{}", "-".repeat(56));
    }

    fn initial_read(&mut self, _case: &TestCase, meta: &RxMetadata) {
        let _ = writeln!(self.out, "Initial timestamp: 0x{:016x}", meta.timestamp);
        let _ = writeln!(self.out, "Initial status:    0x{:08x}", meta.status);
    }

    fn anomaly(&mut self, _case: &TestCase, anomaly: &Anomaly) {
        let line = match anomaly.kind {
            AnomalyKind::TimestampMismatch { expected, actual } => format!(
                "Timestamp mismatch @ {}. Expected 0x{:016x}, got 0x{:016x}",
                anomaly.iteration, expected, actual
            ),
            AnomalyKind::Status { status } => format!("Warning: status=0x{:08x}", status),
        };
        self.problem(line);
    }

    fn device_error(&mut self, context: &str, error: &DeviceError) {
        self.problem(format!("{}: {}", context, error));
    }

    fn case_finished(&mut self, result: &CaseResult) {
        let line = match result.outcome {
            CaseOutcome::Passed => "Test passed.",
            CaseOutcome::Failed => "Test failed.",
            CaseOutcome::Interrupted => "Test interrupted.",
            CaseOutcome::Aborted { .. } => return,
        };
        let line = match (&result.outcome, self.use_color) {
            (CaseOutcome::Passed, true) => line.green().to_string(),
            (_, true) => line.red().to_string(),
            _ => line.to_string(),
        };
        let _ = writeln!(self.out, "{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(progress: ConsoleProgress<Vec<u8>, Vec<u8>>) -> (String, String) {
        let (out, err) = progress.into_writers();
        (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
    }

    #[test]
    fn test_case_lines() {
        let mut progress = ConsoleProgress::with_writers(Vec::new(), Vec::new(), false);
        let case = TestCase::new(1024, 10);
        let meta = RxMetadata { timestamp: 0x1000, ..RxMetadata::default() };

        progress.case_started(&case);
        progress.initial_read(&case, &meta);
        progress.anomaly(&case, &Anomaly::mismatch(3, 0x2000, 0x2010));
        progress.anomaly(&case, &Anomaly::status(3, 1));

        let mut result = CaseResult::new(case);
        result.outcome = CaseOutcome::Failed;
        progress.case_finished(&result);

        let (out, err) = output(progress);
        assert!(out.contains("Test Case: Read size=1024 samples, 10 iterations"));
        assert!(out.contains("Initial timestamp: 0x0000000000001000"));
        assert!(out.contains("Initial status:    0x00000000"));
        assert!(out.ends_with("Test failed.\n"));
        assert!(err.contains("Timestamp mismatch @ 3. Expected 0x0000000000002000, got 0x0000000000002010"));
        assert!(err.contains("Warning: status=0x00000001"));
    }

    #[test]
    fn test_aborted_case_prints_no_verdict() {
        let mut progress = ConsoleProgress::with_writers(Vec::new(), Vec::new(), false);
        let mut result = CaseResult::new(TestCase::new(8, 1));
        result.outcome = CaseOutcome::Aborted { error: "x".into() };
        progress.device_error("RX 0 failed", &DeviceError::from_code(-6));
        progress.case_finished(&result);

        let (out, err) = output(progress);
        assert!(out.is_empty());
        assert_eq!(err, "RX 0 failed: An operation timed out\n");
    }
}
