//! Observer session
//!
//! [`JobObserver`] ties the pieces together for one channel: it owns the
//! observation store, starts and stops the two poll streams, and hands out
//! command issuers and snapshot subscriptions to the presentation layer.

use anyhow::Result;
use harmony_client::{ChannelClient, HttpTransport, Transport};
use harmony_core::domain::job::JobState;
use harmony_core::domain::observation::JobSnapshot;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::scheduler::periodic::TaskHandle;
use crate::scheduler::poller::{Poller, Stream};
use crate::service::commands::CommandIssuer;
use crate::service::intent::IntentLog;
use crate::service::store::ObservationStore;

/// Poll tasks of an active observation
struct Session {
    token: CancellationToken,
    _tasks: Vec<TaskHandle>,
}

/// Client-side controller for one channel's analysis job
///
/// Observation must be started from within a tokio runtime. Dropping the
/// observer stops observation.
pub struct JobObserver {
    config: Config,
    client: ChannelClient,
    intents: IntentLog,
    store: Arc<ObservationStore>,
    session: Option<Session>,
}

impl JobObserver {
    /// Creates an observer that talks HTTP to `config.base_url`
    pub fn new(config: Config) -> Result<Self> {
        let transport = HttpTransport::new(config.base_url.clone());
        Self::with_transport(config, Arc::new(transport))
    }

    /// Creates an observer over any transport
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;

        let client = ChannelClient::new(transport, config.channel_id.clone());
        let intents = IntentLog::new();
        let store = Arc::new(ObservationStore::new(
            config.stage_scale,
            config.staleness_threshold,
            intents.clone(),
        ));

        Ok(Self {
            config,
            client,
            intents,
            store,
            session: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_observing(&self) -> bool {
        self.session.is_some()
    }

    /// Starts both poll streams; does nothing if already observing
    pub fn start_observing(&mut self) {
        if self.session.is_some() {
            return;
        }

        info!(
            "Observing channel {} (progress every {:?}, stage every {:?})",
            self.config.channel_id, self.config.progress_interval, self.config.stage_interval
        );

        self.store.open();

        let token = CancellationToken::new();
        let poller = Poller::new(self.client.clone(), Arc::clone(&self.store), &self.config);
        let tasks = vec![
            poller.spawn_stream(
                Stream::Progress,
                self.config.progress_interval,
                token.child_token(),
            ),
            poller.spawn_stream(
                Stream::Stage,
                self.config.stage_interval,
                token.child_token(),
            ),
        ];

        self.session = Some(Session {
            token,
            _tasks: tasks,
        });
    }

    /// Stops both poll streams
    ///
    /// Timers stop immediately and responses still in flight are discarded
    /// when they arrive. The last snapshot stays readable.
    pub fn stop_observing(&mut self) {
        if let Some(session) = self.session.take() {
            self.store.close();
            session.token.cancel();
            info!("Stopped observing channel {}", self.config.channel_id);
        }
    }

    pub fn snapshot(&self) -> JobSnapshot {
        self.store.snapshot()
    }

    pub fn state(&self) -> JobState {
        self.store.snapshot().state
    }

    /// Receives every published snapshot change
    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.store.subscribe()
    }

    /// Issuer for start, stop and limit commands on this channel
    pub fn commands(&self) -> CommandIssuer {
        CommandIssuer::new(self.client.clone(), self.intents.clone())
    }

    /// Typed client for the channel, for requests outside the job protocol
    pub fn client(&self) -> &ChannelClient {
        &self.client
    }
}

impl Drop for JobObserver {
    fn drop(&mut self) {
        self.stop_observing();
    }
}
