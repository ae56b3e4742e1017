//! Job state reconciliation
//!
//! Derives a single [`JobState`] from the latest stage sample. Progress never
//! drives state: it can lag or arrive out of order relative to stage, so it
//! only feeds diagnostics.

use harmony_core::domain::job::{Intent, JobState, StagePhase, StageScale};
use harmony_core::domain::observation::{Diagnostic, JobObservation};
use std::time::Duration;

/// Progress value that means the current stage finished
const PROGRESS_DONE: i64 = 100;

#[derive(Debug, Clone)]
pub struct Reconciler {
    scale: StageScale,
    staleness: Duration,
    /// State implied by the last stage sample, ignoring staleness
    lifecycle: Option<JobState>,
    last_stage: Option<i64>,
    last_progress: Option<i64>,
}

impl Reconciler {
    pub fn new(scale: StageScale, staleness: Duration) -> Self {
        Self {
            scale,
            staleness,
            lifecycle: None,
            last_stage: None,
            last_progress: None,
        }
    }

    /// Feed a newly applied stage value
    ///
    /// Returns a diagnostic when the stage went backwards for a reason other
    /// than an accepted stop.
    pub fn observe_stage(&mut self, stage: i64, intent: Intent) -> Option<Diagnostic> {
        let next = match self.scale.phase(stage) {
            StagePhase::Running => JobState::Running,
            StagePhase::Complete => JobState::Complete,
            StagePhase::NotStarted => match (self.lifecycle, intent) {
                (
                    Some(JobState::Running | JobState::Complete | JobState::Stopped),
                    Intent::Stop,
                ) => JobState::Stopped,
                _ => JobState::Idle,
            },
        };

        let regression = self
            .last_stage
            .filter(|&from| stage < from && next != JobState::Stopped)
            .map(|from| Diagnostic::StageRegressed { from, to: stage });

        self.lifecycle = Some(next);
        self.last_stage = Some(stage);
        regression
    }

    /// Feed a newly applied progress value
    pub fn observe_progress(&mut self, progress: i64) -> Option<Diagnostic> {
        let regression = self
            .last_progress
            .filter(|&from| progress < from)
            .map(|from| Diagnostic::ProgressRegressed { from, to: progress });

        self.last_progress = Some(progress);
        regression
    }

    /// Current state given how long ago the last stage sample arrived
    ///
    /// `None` means no stage sample has arrived yet.
    pub fn state(&self, stage_age: Option<Duration>) -> JobState {
        match (self.lifecycle, stage_age) {
            (Some(state), Some(age)) if age <= self.staleness => state,
            _ => JobState::Unknown,
        }
    }

    /// Stage and progress disagreement, trusted to stage but reported
    pub fn mismatch(&self, observation: &JobObservation) -> Option<Diagnostic> {
        let stage = observation.stage()?;
        let progress = observation.progress()?;

        (self.scale.phase(stage) == StagePhase::Complete && progress < PROGRESS_DONE)
            .then_some(Diagnostic::StageProgressMismatch { stage, progress })
    }
}
