//! Observation and snapshot types published to readers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::job::JobState;

/// One successfully fetched value of a poll stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub value: i64,
    /// Per-stream sequence number of the request that produced this value
    pub seq: u64,
    pub observed_at: DateTime<Utc>,
}

/// Latest known progress and stage values
///
/// The two fields come from independent requests and are not guaranteed to
/// describe the same instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobObservation {
    pub progress: Option<Sample>,
    pub stage: Option<Sample>,
    /// Time of the most recent successful fetch on either stream
    pub observed_at: Option<DateTime<Utc>>,
}

impl JobObservation {
    pub fn progress(&self) -> Option<i64> {
        self.progress.map(|s| s.value)
    }

    pub fn stage(&self) -> Option<i64> {
        self.stage.map(|s| s.value)
    }
}

/// Inconsistency noticed while reconciling, surfaced instead of hidden
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// Stage says complete but progress has not reached 100
    StageProgressMismatch { stage: i64, progress: i64 },
    /// Stage went backwards without a stop explaining it
    StageRegressed { from: i64, to: i64 },
    ProgressRegressed { from: i64, to: i64 },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::StageProgressMismatch { stage, progress } => write!(
                f,
                "stage {} reports complete but progress is {}",
                stage, progress
            ),
            Diagnostic::StageRegressed { from, to } => {
                write!(f, "stage regressed from {} to {}", from, to)
            }
            Diagnostic::ProgressRegressed { from, to } => {
                write!(f, "progress regressed from {} to {}", from, to)
            }
        }
    }
}

/// Per-stream poll health
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamHealth {
    /// Failures since the last success; reset to zero on success
    pub consecutive_failures: u32,
    pub total_failures: u64,
    /// Ticks that issued no request because one was still outstanding
    pub skipped_ticks: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCounters {
    pub progress: StreamHealth,
    pub stage: StreamHealth,
}

/// Everything a presentation layer needs, published as one value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub observation: JobObservation,
    pub state: JobState,
    pub diagnostics: Vec<Diagnostic>,
    pub failures: FailureCounters,
}
