//! Cancellable periodic task
//!
//! `spawn_periodic(interval, token, on_tick)` fires `on_tick` every
//! `interval` until the returned [`TaskHandle`] is cancelled or dropped.
//! The first tick fires immediately.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Handle to a running periodic task
///
/// Cancelling stops the timer at once; no tick fires after `cancel` returns
/// control to the runtime. Dropping the handle cancels the task.
#[derive(Debug)]
pub struct TaskHandle {
    token: CancellationToken,
    join: Option<JoinHandle<()>>,
}

impl TaskHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel and wait for the timer task to exit
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(join) = self.join.take() {
            if let Err(e) = join.await {
                tracing::warn!("Periodic task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Spawns a periodic task on the current tokio runtime
///
/// `token` may be a child of a session-wide token so one cancel stops
/// several tasks. Ticks missed while the runtime was busy are skipped
/// rather than fired in a burst.
pub fn spawn_periodic<F>(interval: Duration, token: CancellationToken, mut on_tick: F) -> TaskHandle
where
    F: FnMut() + Send + 'static,
{
    let task_token = token.clone();

    let join = tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = task_token.cancelled() => break,
                _ = ticker.tick() => on_tick(),
            }
        }
    });

    TaskHandle {
        token,
        join: Some(join),
    }
}
