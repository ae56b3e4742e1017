//! Observer configuration
//!
//! Endpoint root, the channel to observe, poll intervals, staleness and the
//! opt-in hardening knobs (request timeout, failure backoff).

use anyhow::Context;
use harmony_core::domain::channel::ChannelId;
use harmony_core::domain::job::StageScale;
use std::time::Duration;

/// Default endpoint root of the analysis server
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Default interval of both poll streams
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Staleness threshold as a multiple of the stage interval
pub const STALENESS_FACTOR: u32 = 3;

/// Exponential backoff applied to a stream after consecutive failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Backoff {
    /// Delay before the next request after `failures` consecutive failures
    pub fn delay(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }
        let exponent = (failures - 1).min(16);
        self.initial
            .saturating_mul(1u32 << exponent)
            .min(self.max)
    }
}

/// Observer configuration
///
/// Passed explicitly to everything that needs it; nothing reads a global.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server base URL (e.g., "http://localhost:5000")
    pub base_url: String,

    /// Channel whose analysis job is observed
    pub channel_id: ChannelId,

    /// How often to poll the progress endpoint
    pub progress_interval: Duration,

    /// How often to poll the stage endpoint
    pub stage_interval: Duration,

    /// Age of the last stage observation after which the state is unknown
    pub staleness_threshold: Duration,

    /// Maps stage values onto not-started / running / complete
    pub stage_scale: StageScale,

    /// Fail poll requests that take longer than this
    pub request_timeout: Option<Duration>,

    /// Back off a failing stream instead of polling it every tick
    pub backoff: Option<Backoff>,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(base_url: String, channel_id: ChannelId) -> Self {
        Self {
            base_url,
            channel_id,
            progress_interval: DEFAULT_POLL_INTERVAL,
            stage_interval: DEFAULT_POLL_INTERVAL,
            staleness_threshold: DEFAULT_POLL_INTERVAL * STALENESS_FACTOR,
            stage_scale: StageScale::default(),
            request_timeout: None,
            backoff: None,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - HARMONY_CHANNEL_ID (required)
    /// - HARMONY_BASE_URL (optional, default: http://localhost:5000)
    /// - HARMONY_PROGRESS_INTERVAL_MS (optional, default: 250)
    /// - HARMONY_STAGE_INTERVAL_MS (optional, default: 250)
    /// - HARMONY_STALENESS_MS (optional, default: 3x stage interval)
    /// - HARMONY_COMPLETION_STAGE (optional, default: 2)
    /// - HARMONY_REQUEST_TIMEOUT_MS (optional, default: none)
    /// - HARMONY_BACKOFF_INITIAL_MS / HARMONY_BACKOFF_MAX_MS (optional, both needed)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Creates configuration from any variable source, see [`Config::from_env`]
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let channel = var("HARMONY_CHANNEL_ID")
            .ok_or_else(|| anyhow::anyhow!("HARMONY_CHANNEL_ID environment variable not set"))?;
        let channel_id = ChannelId::parse(&channel).context("HARMONY_CHANNEL_ID is invalid")?;

        let base_url = var("HARMONY_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let millis = |name: &str| -> anyhow::Result<Option<Duration>> {
            var(name)
                .map(|value| {
                    value
                        .parse::<u64>()
                        .map(Duration::from_millis)
                        .with_context(|| format!("{} must be a number of milliseconds", name))
                })
                .transpose()
        };

        let mut config = Self::new(base_url, channel_id);

        if let Some(interval) = millis("HARMONY_PROGRESS_INTERVAL_MS")? {
            config.progress_interval = interval;
        }
        if let Some(interval) = millis("HARMONY_STAGE_INTERVAL_MS")? {
            config.stage_interval = interval;
        }
        config.staleness_threshold = millis("HARMONY_STALENESS_MS")?
            .unwrap_or(config.stage_interval * STALENESS_FACTOR);

        if let Some(stage) = var("HARMONY_COMPLETION_STAGE") {
            let stage = stage
                .parse::<i64>()
                .context("HARMONY_COMPLETION_STAGE must be an integer")?;
            config.stage_scale = StageScale::new(stage);
        }

        config.request_timeout = millis("HARMONY_REQUEST_TIMEOUT_MS")?;

        config.backoff = match (
            millis("HARMONY_BACKOFF_INITIAL_MS")?,
            millis("HARMONY_BACKOFF_MAX_MS")?,
        ) {
            (Some(initial), Some(max)) => Some(Backoff { initial, max }),
            (None, None) => None,
            _ => anyhow::bail!(
                "HARMONY_BACKOFF_INITIAL_MS and HARMONY_BACKOFF_MAX_MS must be set together"
            ),
        };

        Ok(config)
    }

    /// Sets both poll intervals and rescales the staleness threshold
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self.stage_interval = interval;
        self.staleness_threshold = interval * STALENESS_FACTOR;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_url.is_empty() {
            anyhow::bail!("base_url cannot be empty");
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            anyhow::bail!("base_url must start with http:// or https://");
        }

        if self.progress_interval.is_zero() {
            anyhow::bail!("progress_interval must be greater than 0");
        }

        if self.stage_interval.is_zero() {
            anyhow::bail!("stage_interval must be greater than 0");
        }

        if self.staleness_threshold < self.stage_interval {
            anyhow::bail!("staleness_threshold must be at least the stage interval");
        }

        if self.stage_scale.completion_stage <= 0 {
            anyhow::bail!("completion_stage must be greater than 0");
        }

        if let Some(timeout) = self.request_timeout {
            if timeout.is_zero() {
                anyhow::bail!("request_timeout must be greater than 0");
            }
        }

        if let Some(backoff) = self.backoff {
            if backoff.initial.is_zero() || backoff.max < backoff.initial {
                anyhow::bail!("backoff requires 0 < initial <= max");
            }
        }

        Ok(())
    }
}
