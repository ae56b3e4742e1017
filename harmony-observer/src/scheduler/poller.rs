//! Progress and stage poller
//!
//! Each stream runs on its own periodic task. A tick issues a request only
//! if the stream's single in-flight slot is free; otherwise the tick is
//! skipped, so a slow server never accumulates a backlog. Requests run in
//! their own task so the timer keeps ticking (and can be cancelled) while
//! one is outstanding.

use harmony_client::{ChannelClient, TransportError};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::{Backoff, Config};
use crate::scheduler::periodic::{TaskHandle, spawn_periodic};
use crate::service::store::{ObservationStore, Ticket};

/// One of the two independently polled endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Progress,
    Stage,
}

impl Stream {
    async fn fetch(self, client: &ChannelClient) -> Result<i64, TransportError> {
        match self {
            Stream::Progress => client.get_progress().await,
            Stream::Stage => client.get_stage().await,
        }
    }
}

impl std::fmt::Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stream::Progress => f.write_str("progress"),
            Stream::Stage => f.write_str("stage"),
        }
    }
}

/// Spawns poll streams that feed an [`ObservationStore`]
#[derive(Clone)]
pub struct Poller {
    client: ChannelClient,
    store: Arc<ObservationStore>,
    request_timeout: Option<Duration>,
    backoff: Option<Backoff>,
}

impl Poller {
    pub fn new(client: ChannelClient, store: Arc<ObservationStore>, config: &Config) -> Self {
        Self {
            client,
            store,
            request_timeout: config.request_timeout,
            backoff: config.backoff,
        }
    }

    /// Starts polling `stream` every `interval` until `token` is cancelled
    ///
    /// Cancelling also abandons the stream's outstanding request, if any.
    pub fn spawn_stream(
        &self,
        stream: Stream,
        interval: Duration,
        token: CancellationToken,
    ) -> TaskHandle {
        let slot = Arc::new(Semaphore::new(1));
        let not_before: Arc<Mutex<Option<Instant>>> = Arc::new(Mutex::new(None));
        let poller = self.clone();
        let request_token = token.clone();

        debug!("Starting {} stream (interval: {:?})", stream, interval);

        spawn_periodic(interval, token, move || {
            let now = Instant::now();

            let backing_off = not_before
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_some_and(|until| now < until);
            if backing_off {
                debug!("{} stream backing off, tick skipped", stream);
                poller.store.refresh(now);
                return;
            }

            // At most one request per stream; skip while the last is outstanding
            let permit = match Arc::clone(&slot).try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => {
                    debug!("{} request still in flight, tick skipped", stream);
                    poller.store.skip(stream, now);
                    return;
                }
            };

            poller.store.refresh(now);
            let Some(ticket) = poller.store.issue(stream) else {
                return;
            };

            poller.spawn_request(
                ticket,
                permit,
                request_token.clone(),
                Arc::clone(&not_before),
            );
        })
    }

    fn spawn_request(
        &self,
        ticket: Ticket,
        permit: OwnedSemaphorePermit,
        token: CancellationToken,
        not_before: Arc<Mutex<Option<Instant>>>,
    ) {
        let poller = self.clone();

        tokio::spawn(async move {
            let _permit = permit;

            let result = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("{} request #{} abandoned", ticket.stream, ticket.seq);
                    return;
                }
                result = poller.fetch(ticket.stream) => result,
            };

            let now = Instant::now();
            match result {
                Ok(value) => {
                    if poller.store.apply(ticket, value, now) {
                        debug!("{} #{} = {}", ticket.stream, ticket.seq, value);
                        *not_before.lock().unwrap_or_else(PoisonError::into_inner) = None;
                    } else {
                        debug!("{} #{} discarded", ticket.stream, ticket.seq);
                    }
                }
                Err(e) => {
                    let Some(failures) = poller.store.fail(ticket, now) else {
                        return;
                    };
                    warn!(
                        "Failed to poll {} ({} consecutive): {}",
                        ticket.stream, failures, e
                    );
                    if let Some(backoff) = poller.backoff {
                        *not_before.lock().unwrap_or_else(PoisonError::into_inner) =
                            Some(now + backoff.delay(failures));
                    }
                }
            }
        });
    }

    async fn fetch(&self, stream: Stream) -> Result<i64, TransportError> {
        match self.request_timeout {
            Some(limit) => time::timeout(limit, stream.fetch(&self.client))
                .await
                .unwrap_or(Err(TransportError::Timeout)),
            None => stream.fetch(&self.client).await,
        }
    }
}
