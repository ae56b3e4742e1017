//! Configuration module
//!
//! Connection settings shared by every subcommand.

use harmony_core::domain::channel::ChannelId;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Endpoint root of the analysis server
    pub base_url: String,
    /// Channel whose analysis job the commands act on
    pub channel: ChannelId,
}
