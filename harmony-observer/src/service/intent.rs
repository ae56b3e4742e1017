//! Record of lifecycle commands sent to the server
//!
//! Written only by the command issuer and read only by the reconciler, which
//! needs to know whether a stop was asked for to tell `Stopped` from `Idle`.

use harmony_core::domain::job::Intent;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct IntentState {
    intent: Intent,
    generation: u64,
}

/// Receipt for one `record`, needed to take it back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recorded {
    previous: Intent,
    generation: u64,
}

#[derive(Debug, Clone, Default)]
pub struct IntentLog {
    state: Arc<Mutex<IntentState>>,
}

impl IntentLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Intent {
        self.lock().intent
    }

    /// Record `intent`, returning a receipt for a later `revert`
    pub fn record(&self, intent: Intent) -> Recorded {
        let mut state = self.lock();
        state.generation += 1;
        let previous = std::mem::replace(&mut state.intent, intent);
        Recorded {
            previous,
            generation: state.generation,
        }
    }

    /// Undo a `record` whose command failed
    ///
    /// Does nothing if any intent was recorded after it, even an equal one.
    pub fn revert(&self, recorded: Recorded) {
        let mut state = self.lock();
        if state.generation == recorded.generation {
            state.intent = recorded.previous;
        }
    }

    fn lock(&self) -> MutexGuard<'_, IntentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
