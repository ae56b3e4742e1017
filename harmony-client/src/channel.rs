//! Channel job endpoints
//!
//! Typed wrappers over the `/api/channel/{id}/...` routes, all scoped to the
//! channel the client was built for.

use harmony_core::domain::channel::ChannelId;
use harmony_core::domain::error::ValidationError;
use harmony_core::domain::job::Limit;
use harmony_core::dto::{
    AlternatesListing, LimitRequest, LimitResponse, ProgressResponse, StageResponse,
    UserAlternates,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{Result, TransportError};
use crate::transport::{HttpTransport, Transport};

/// Client for one channel's analysis job
#[derive(Clone)]
pub struct ChannelClient {
    transport: Arc<dyn Transport>,
    channel: ChannelId,
}

impl ChannelClient {
    pub fn new(transport: Arc<dyn Transport>, channel: ChannelId) -> Self {
        Self { transport, channel }
    }

    /// Create a client backed by an [`HttpTransport`]
    ///
    /// # Example
    /// ```
    /// use harmony_client::ChannelClient;
    /// use harmony_core::domain::channel::ChannelId;
    ///
    /// let channel = ChannelId::parse("979554513021177909").unwrap();
    /// let client = ChannelClient::http("http://localhost:5000", channel);
    /// assert_eq!(client.path("pog"), "/api/channel/979554513021177909/pog");
    /// ```
    pub fn http(base_url: impl Into<String>, channel: ChannelId) -> Self {
        Self::new(Arc::new(HttpTransport::new(base_url)), channel)
    }

    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    /// Path of a channel endpoint, relative to the base URL
    pub fn path(&self, endpoint: &str) -> String {
        format!("/api/channel/{}/{}", self.channel, endpoint)
    }

    // =============================================================================
    // Observation
    // =============================================================================

    /// Fetch the progress of the current stage
    pub async fn get_progress(&self) -> Result<i64> {
        let value = self.transport.get(&self.path("pog")).await?;
        let body: ProgressResponse = parse(value)?;
        Ok(body.progress)
    }

    /// Fetch the current analysis stage
    pub async fn get_stage(&self) -> Result<i64> {
        let value = self.transport.get(&self.path("stage")).await?;
        let body: StageResponse = parse(value)?;
        Ok(body.stage)
    }

    /// Fetch the configured message limit (0 when never set)
    pub async fn get_limit(&self) -> Result<i64> {
        let value = self.transport.get(&self.path("limit")).await?;
        let body: LimitResponse = parse(value)?;
        Ok(body.limit)
    }

    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Ask the server to start (or continue) analysis
    pub async fn start(&self) -> Result<()> {
        self.transport.put(&self.path("start"), None).await?;
        Ok(())
    }

    /// Ask the server to stop analysis
    pub async fn stop(&self) -> Result<()> {
        self.transport.put(&self.path("stop"), None).await?;
        Ok(())
    }

    /// Set the maximum number of messages to analyze
    pub async fn set_limit(&self, limit: Limit) -> Result<()> {
        let body = to_body(&LimitRequest { limit })?;
        self.transport.put(&self.path("limit"), Some(&body)).await?;
        Ok(())
    }

    // =============================================================================
    // User Alternates
    // =============================================================================

    /// List alternate names per user
    pub async fn list_alternates(&self) -> Result<AlternatesListing> {
        let value = self.transport.get(&self.path("alts")).await?;
        parse(value)
    }

    /// Register alternate names for users
    pub async fn add_alternates(&self, alternates: &[UserAlternates]) -> Result<()> {
        let body = alternates_body(alternates)?;
        self.transport.post(&self.path("alts"), &body).await?;
        Ok(())
    }

    /// Remove alternate names for users
    pub async fn remove_alternates(&self, alternates: &[UserAlternates]) -> Result<()> {
        let body = alternates_body(alternates)?;
        self.transport.delete(&self.path("alts"), &body).await?;
        Ok(())
    }
}

impl std::fmt::Debug for ChannelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelClient")
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

fn parse<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| TransportError::ParseError(format!("Unexpected response body: {}", e)))
}

fn to_body<T: serde::Serialize>(body: &T) -> Result<Value> {
    serde_json::to_value(body).map_err(|e| TransportError::InvalidRequest(e.to_string()))
}

fn alternates_body(alternates: &[UserAlternates]) -> Result<Value> {
    if alternates.is_empty() {
        return Err(ValidationError::InvalidAlternates("no alternates given".to_string()).into());
    }
    for alt in alternates {
        alt.validate()?;
    }
    to_body(&alternates)
}
