//! Statistics over observed timestamp steps and run outcomes

use crate::models::{CaseOutcome, CaseResult};
use serde::{Deserialize, Serialize};

/// Streaming statistics of the timestamp delta between consecutive reads
///
/// Deltas are signed so a timestamp that steps backwards shows up as a
/// negative step. Mean and variance use Welford's online update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepStats {
    pub count: u64,
    pub min: Option<i64>,
    pub max: Option<i64>,
    mean: f64,
    m2: f64,
}

impl StepStats {
    pub fn new() -> Self {
        Self {
            count: 0,
            min: None,
            max: None,
            mean: 0.0,
            m2: 0.0,
        }
    }

    /// Record the delta between two consecutive timestamps
    pub fn add_delta(&mut self, delta: i64) {
        self.count += 1;
        self.min = Some(self.min.map_or(delta, |m| m.min(delta)));
        self.max = Some(self.max.map_or(delta, |m| m.max(delta)));

        let value = delta as f64;
        let diff = value - self.mean;
        self.mean += diff / self.count as f64;
        self.m2 += diff * (value - self.mean);
    }

    /// Record the step between two raw timestamps, wrapping at `u64::MAX`
    pub fn add_timestamps(&mut self, previous: u64, current: u64) {
        self.add_delta(current.wrapping_sub(previous) as i64);
    }

    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.mean)
        }
    }

    /// Population standard deviation
    pub fn std_dev(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some((self.m2 / self.count as f64).max(0.0).sqrt())
    }

    /// True when every observed delta equals `step`
    pub fn is_constant(&self, step: u64) -> bool {
        let step = i64::try_from(step).ok();
        self.count > 0 && self.min == step && self.max == step
    }
}

impl Default for StepStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate counters over a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_cases: u32,
    pub passed: u32,
    pub failed: u32,
    pub aborted: u32,
    pub interrupted: u32,
    /// Successful receive calls, initial reads included
    pub total_reads: u64,
    pub total_samples: u64,
    pub total_mismatches: u64,
    pub total_status_warnings: u64,
    pub total_duration_ms: f64,
}

impl RunSummary {
    /// Summarize a list of case results
    pub fn from_cases(cases: &[CaseResult]) -> Self {
        let mut summary = Self::default();

        for case in cases {
            summary.total_cases += 1;
            match case.outcome {
                CaseOutcome::Passed => summary.passed += 1,
                CaseOutcome::Failed => summary.failed += 1,
                CaseOutcome::Aborted { .. } => summary.aborted += 1,
                CaseOutcome::Interrupted => summary.interrupted += 1,
            }

            summary.total_reads += case.reads_completed + u64::from(case.initial_timestamp.is_some());
            summary.total_samples += case.samples_received();
            summary.total_mismatches += case.mismatch_count;
            summary.total_status_warnings += case.status_count;
            summary.total_duration_ms += case.duration_ms;
        }

        summary
    }

    /// Percentage of cases that passed
    pub fn pass_rate(&self) -> f64 {
        if self.total_cases == 0 {
            0.0
        } else {
            self.passed as f64 / self.total_cases as f64 * 100.0
        }
    }

    /// Samples per second across the run, if any time elapsed
    pub fn throughput_sps(&self) -> Option<f64> {
        if self.total_duration_ms > 0.0 {
            Some(self.total_samples as f64 / (self.total_duration_ms / 1000.0))
        } else {
            None
        }
    }
}
