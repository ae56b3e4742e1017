//! Observation store
//!
//! The single writer-side record of a session. Poll streams take a
//! sequence-numbered [`Ticket`] before each request and hand the result
//! back with it; the store applies a result only if its sequence number is
//! newer than anything already applied on that stream and the store is
//! open. Every change is republished as a [`JobSnapshot`] on a watch
//! channel, so readers never hold the lock writers need.

use chrono::Utc;
use harmony_core::domain::job::{JobState, StageScale};
use harmony_core::domain::observation::{
    Diagnostic, FailureCounters, JobObservation, JobSnapshot, Sample, StreamHealth,
};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::scheduler::Stream;
use crate::service::intent::IntentLog;
use crate::service::reconciler::Reconciler;

/// Permission to apply one response on one stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub stream: Stream,
    pub seq: u64,
}

#[derive(Debug, Default)]
struct StreamSlot {
    issued: u64,
    applied: u64,
    health: StreamHealth,
    last_success: Option<Instant>,
    regression: Option<Diagnostic>,
}

impl StreamSlot {
    fn accepts(&self, seq: u64) -> bool {
        seq > self.applied
    }
}

#[derive(Debug)]
struct StoreInner {
    open: bool,
    progress: StreamSlot,
    stage: StreamSlot,
    observation: JobObservation,
    reconciler: Reconciler,
}

impl StoreInner {
    fn slot(&mut self, stream: Stream) -> &mut StreamSlot {
        match stream {
            Stream::Progress => &mut self.progress,
            Stream::Stage => &mut self.stage,
        }
    }
}

pub struct ObservationStore {
    inner: Mutex<StoreInner>,
    intents: IntentLog,
    tx: watch::Sender<JobSnapshot>,
}

impl ObservationStore {
    pub fn new(scale: StageScale, staleness: Duration, intents: IntentLog) -> Self {
        let (tx, _rx) = watch::channel(JobSnapshot::default());
        Self {
            inner: Mutex::new(StoreInner {
                open: false,
                progress: StreamSlot::default(),
                stage: StreamSlot::default(),
                observation: JobObservation::default(),
                reconciler: Reconciler::new(scale, staleness),
            }),
            intents,
            tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> JobSnapshot {
        self.tx.borrow().clone()
    }

    /// Start accepting tickets and results
    pub fn open(&self) {
        self.lock().open = true;
    }

    /// Stop accepting results
    ///
    /// Every ticket issued so far becomes stale, so responses still in
    /// flight are discarded when they arrive, even after a later `open`.
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.open = false;
        for stream in [Stream::Progress, Stream::Stage] {
            let slot = inner.slot(stream);
            slot.applied = slot.applied.max(slot.issued);
        }
    }

    /// Reserve the next sequence number on `stream`; `None` while closed
    pub fn issue(&self, stream: Stream) -> Option<Ticket> {
        let mut inner = self.lock();
        if !inner.open {
            return None;
        }
        let slot = inner.slot(stream);
        slot.issued += 1;
        Some(Ticket {
            stream,
            seq: slot.issued,
        })
    }

    /// Apply a successful response; returns false if it was discarded
    pub fn apply(&self, ticket: Ticket, value: i64, now: Instant) -> bool {
        let mut inner = self.lock();
        if !inner.open || !inner.slot(ticket.stream).accepts(ticket.seq) {
            return false;
        }

        let sample = Sample {
            value,
            seq: ticket.seq,
            observed_at: Utc::now(),
        };

        let regression = match ticket.stream {
            Stream::Progress => {
                inner.observation.progress = Some(sample);
                inner.reconciler.observe_progress(value)
            }
            Stream::Stage => {
                inner.observation.stage = Some(sample);
                let intent = self.intents.current();
                inner.reconciler.observe_stage(value, intent)
            }
        };
        inner.observation.observed_at = Some(sample.observed_at);

        if let Some(diagnostic) = regression {
            warn!("{} stream: {}", ticket.stream, diagnostic);
        }

        let slot = inner.slot(ticket.stream);
        slot.applied = ticket.seq;
        slot.last_success = Some(now);
        slot.health.consecutive_failures = 0;
        slot.regression = regression;

        self.publish(&inner, now);
        true
    }

    /// Count a failed request
    ///
    /// Returns the stream's consecutive failure count, or `None` if the
    /// ticket was stale and nothing was recorded.
    pub fn fail(&self, ticket: Ticket, now: Instant) -> Option<u32> {
        let mut inner = self.lock();
        if !inner.open || !inner.slot(ticket.stream).accepts(ticket.seq) {
            return None;
        }

        let slot = inner.slot(ticket.stream);
        slot.health.consecutive_failures = slot.health.consecutive_failures.saturating_add(1);
        slot.health.total_failures += 1;
        let failures = slot.health.consecutive_failures;

        self.publish(&inner, now);
        Some(failures)
    }

    /// Count a tick that issued no request because one was outstanding
    pub fn skip(&self, stream: Stream, now: Instant) {
        let mut inner = self.lock();
        if !inner.open {
            return;
        }
        inner.slot(stream).health.skipped_ticks += 1;
        self.publish(&inner, now);
    }

    /// Re-evaluate staleness without new data
    pub fn refresh(&self, now: Instant) {
        let inner = self.lock();
        if inner.open {
            self.publish(&inner, now);
        }
    }

    fn publish(&self, inner: &StoreInner, now: Instant) {
        let stage_age = inner
            .stage
            .last_success
            .map(|at| now.saturating_duration_since(at));
        let state = inner.reconciler.state(stage_age);

        let mut diagnostics: Vec<Diagnostic> = [inner.stage.regression, inner.progress.regression]
            .into_iter()
            .flatten()
            .collect();
        if let Some(mismatch) = inner.reconciler.mismatch(&inner.observation) {
            diagnostics.push(mismatch);
        }

        let snapshot = JobSnapshot {
            observation: inner.observation.clone(),
            state,
            diagnostics,
            failures: FailureCounters {
                progress: inner.progress.health,
                stage: inner.stage.health,
            },
        };

        self.tx.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            if current.state != snapshot.state {
                log_transition(current.state, &snapshot);
            }
            for diagnostic in &snapshot.diagnostics {
                if matches!(diagnostic, Diagnostic::StageProgressMismatch { .. })
                    && !current.diagnostics.contains(diagnostic)
                {
                    warn!("{}", diagnostic);
                }
            }
            *current = snapshot;
            true
        });
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn log_transition(from: JobState, snapshot: &JobSnapshot) {
    if snapshot.state == JobState::Unknown {
        warn!(
            "Job state {} -> {} (stage failures: {})",
            from, snapshot.state, snapshot.failures.stage.consecutive_failures
        );
    } else {
        info!("Job state {} -> {}", from, snapshot.state);
    }
}
