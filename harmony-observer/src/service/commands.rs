//! Command issuer
//!
//! Turns a [`JobCommand`] into exactly one request. Nothing here touches the
//! observation store: the effect of a command shows up in the next poll.
//! Lifecycle commands are noted in the [`IntentLog`] before the request goes
//! out, so a stage change racing the response is still attributed to it, and
//! taken back if the request fails.

use harmony_client::ChannelClient;
use harmony_core::domain::job::{Intent, JobCommand, Limit};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::{CommandError, Result};
use crate::service::intent::IntentLog;

#[derive(Debug, Clone)]
pub struct CommandIssuer {
    client: ChannelClient,
    intents: IntentLog,
}

impl CommandIssuer {
    pub fn new(client: ChannelClient, intents: IntentLog) -> Self {
        Self { client, intents }
    }

    pub async fn start(&self) -> Result<()> {
        self.issue(JobCommand::Start).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.issue(JobCommand::Stop).await
    }

    /// Set the message limit; non-positive values fail without a request
    pub async fn set_limit(&self, limit: i64) -> Result<()> {
        let limit = Limit::new(limit)?;
        self.issue(JobCommand::SetLimit(limit)).await
    }

    /// Send one command and report the server's answer
    pub async fn issue(&self, command: JobCommand) -> Result<()> {
        let intent = match command {
            JobCommand::Start => Some(Intent::Start),
            JobCommand::Stop => Some(Intent::Stop),
            JobCommand::SetLimit(_) => None,
        };
        let recorded = intent.map(|intent| self.intents.record(intent));

        info!("Sending {} command for channel {}", command.name(), self.client.channel());

        let result = match command {
            JobCommand::Start => self.client.start().await,
            JobCommand::Stop => self.client.stop().await,
            JobCommand::SetLimit(limit) => self.client.set_limit(limit).await,
        };

        result.map_err(|source| {
            warn!("{} command failed: {}", command.name(), source);
            if let Some(recorded) = recorded {
                self.intents.revert(recorded);
            }
            CommandError::Transport {
                command: command.name(),
                source,
            }
        })
    }

    /// Send a command in the background
    ///
    /// The returned handle resolves with the command's result; dropping it
    /// does not cancel the request.
    pub fn dispatch(&self, command: JobCommand) -> JoinHandle<Result<()>> {
        let issuer = self.clone();
        tokio::spawn(async move { issuer.issue(command).await })
    }
}
