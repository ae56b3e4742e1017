//! Job domain types

use serde::{Deserialize, Serialize};

use crate::domain::error::ValidationError;

/// Maximum number of messages the server analyzes
///
/// Always positive; construct with [`Limit::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Limit(i64);

impl Limit {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(ValidationError::NonPositiveLimit(value))
        }
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Limit {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Limit> for i64 {
    fn from(limit: Limit) -> Self {
        limit.0
    }
}

impl std::fmt::Display for Limit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Command sent to the server for the observed job
///
/// Commands are fire-and-forget: the server's new state shows up through
/// the next poll, never through the command result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobCommand {
    Start,
    Stop,
    SetLimit(Limit),
}

impl JobCommand {
    pub fn name(&self) -> &'static str {
        match self {
            JobCommand::Start => "start",
            JobCommand::Stop => "stop",
            JobCommand::SetLimit(_) => "limit",
        }
    }
}

/// Last lifecycle command the server accepted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    #[default]
    None,
    Start,
    Stop,
}

/// Reconciled lifecycle state of the job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    /// Never started, or the stage reads not-started
    Idle,
    Running,
    Complete,
    /// Server went back to not-started after a stop was accepted
    Stopped,
    /// No stage observation yet, or the last one is stale
    #[default]
    Unknown,
}

impl JobState {
    /// Whether the job has reached a state it will not leave on its own
    pub fn is_settled(self) -> bool {
        matches!(self, JobState::Complete | JobState::Stopped)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JobState::Idle => "idle",
            JobState::Running => "running",
            JobState::Complete => "complete",
            JobState::Stopped => "stopped",
            JobState::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Coarse phase a raw stage value falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagePhase {
    NotStarted,
    Running,
    Complete,
}

/// Maps raw stage integers onto phases
///
/// `stage <= 0` is not started, anything below `completion_stage` is
/// running, and `completion_stage` or above is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageScale {
    pub completion_stage: i64,
}

impl StageScale {
    pub const DEFAULT_COMPLETION_STAGE: i64 = 2;

    pub fn new(completion_stage: i64) -> Self {
        Self { completion_stage }
    }

    pub fn phase(&self, stage: i64) -> StagePhase {
        if stage <= 0 {
            StagePhase::NotStarted
        } else if stage < self.completion_stage {
            StagePhase::Running
        } else {
            StagePhase::Complete
        }
    }
}

impl Default for StageScale {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COMPLETION_STAGE)
    }
}
