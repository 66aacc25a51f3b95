//! Per-case and per-run results

use crate::{
    models::{StreamParams, TestCase},
    stats::{RunSummary, StepStats},
    types::Backend,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What went wrong on a single read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnomalyKind {
    /// The returned timestamp is not the predicted one
    TimestampMismatch { expected: u64, actual: u64 },
    /// The metadata status word was non-zero
    Status { status: u32 },
}

/// An anomaly observed at a loop iteration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomaly {
    pub iteration: u32,
    #[serde(flatten)]
    pub kind: AnomalyKind,
}

impl Anomaly {
    pub fn mismatch(iteration: u32, expected: u64, actual: u64) -> Self {
        Self { iteration, kind: AnomalyKind::TimestampMismatch { expected, actual } }
    }

    pub fn status(iteration: u32, status: u32) -> Self {
        Self { iteration, kind: AnomalyKind::Status { status } }
    }

    /// Signed distance of the received timestamp from the expected one,
    /// in ticks. Positive means samples were skipped.
    pub fn offset_ticks(&self) -> Option<i64> {
        match self.kind {
            AnomalyKind::TimestampMismatch { expected, actual } => Some(actual.wrapping_sub(expected) as i64),
            AnomalyKind::Status { .. } => None,
        }
    }
}

/// Final state of a test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CaseOutcome {
    Passed,
    Failed,
    /// A driver call failed part-way; the case was abandoned
    Aborted { error: String },
    /// Stopped by the user
    Interrupted,
}

impl CaseOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Passed => "PASS",
            Self::Failed => "FAIL",
            Self::Aborted { .. } => "ABORT",
            Self::Interrupted => "STOP",
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Result of one test case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub case: TestCase,
    pub initial_timestamp: Option<u64>,
    pub initial_status: Option<u32>,
    /// Loop reads that returned successfully (the initial read excluded)
    pub reads_completed: u64,
    pub mismatch_count: u64,
    pub status_count: u64,
    /// First anomalies, capped; the counts above cover all of them
    pub anomalies: Vec<Anomaly>,
    pub step_stats: StepStats,
    pub outcome: CaseOutcome,
    pub duration_ms: f64,
}

impl CaseResult {
    pub fn new(case: TestCase) -> Self {
        Self {
            case,
            initial_timestamp: None,
            initial_status: None,
            reads_completed: 0,
            mismatch_count: 0,
            status_count: 0,
            anomalies: Vec::new(),
            step_stats: StepStats::new(),
            outcome: CaseOutcome::Passed,
            duration_ms: 0.0,
        }
    }

    pub fn anomaly_count(&self) -> u64 {
        self.mismatch_count + self.status_count
    }

    /// Samples successfully received, counting the initial read
    pub fn samples_received(&self) -> u64 {
        let reads = self.reads_completed + u64::from(self.initial_timestamp.is_some());
        reads.saturating_mul(self.case.gap)
    }
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub backend: Backend,
    pub device: String,
    pub stream: StreamParams,
    pub timestamp_step: u64,
    pub keep_going: bool,
    pub cases: Vec<CaseResult>,
    pub summary: RunSummary,
    /// Error that stopped the whole run, if any
    pub fatal_error: Option<String>,
    /// Set when a stop request ended the run before its last case finished
    #[serde(default)]
    pub stopped_early: bool,
}

impl RunReport {
    /// True when every case passed and nothing stopped the run
    pub fn passed(&self) -> bool {
        self.fatal_error.is_none()
            && !self.stopped_early
            && !self.cases.is_empty()
            && self.cases.iter().all(|c| c.outcome.is_pass())
    }

    pub fn interrupted(&self) -> bool {
        self.stopped_early || self.cases.iter().any(|c| c.outcome == CaseOutcome::Interrupted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anomaly_offsets() {
        assert_eq!(Anomaly::mismatch(3, 100, 120).offset_ticks(), Some(20));
        assert_eq!(Anomaly::mismatch(3, 100, 90).offset_ticks(), Some(-10));
        assert_eq!(Anomaly::status(3, 1).offset_ticks(), None);
    }

    #[test]
    fn test_case_result_counters() {
        let mut result = CaseResult::new(TestCase::new(100, 10));
        assert_eq!(result.samples_received(), 0);

        result.initial_timestamp = Some(0);
        result.reads_completed = 4;
        result.mismatch_count = 1;
        result.status_count = 2;
        assert_eq!(result.samples_received(), 500);
        assert_eq!(result.anomaly_count(), 3);
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&CaseOutcome::Aborted { error: "timeout".into() }).unwrap();
        assert_eq!(json, r#"{"outcome":"aborted","error":"timeout"}"#);

        let anomaly = serde_json::to_value(Anomaly::mismatch(7, 10, 12)).unwrap();
        assert_eq!(anomaly["type"], "timestamp_mismatch");
        assert_eq!(anomaly["iteration"], 7);
        assert_eq!(anomaly["actual"], 12);
    }
}
