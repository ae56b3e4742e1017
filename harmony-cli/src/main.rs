//! Harmony CLI
//!
//! Command-line interface for controlling and watching a channel's
//! sentiment analysis job.

mod commands;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use harmony_core::domain::channel::ChannelId;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "harmony")]
#[command(about = "Channel sentiment analysis job CLI", long_about = None)]
struct Cli {
    /// Analysis server URL
    #[arg(long, env = "HARMONY_BASE_URL", default_value = "http://localhost:5000")]
    base_url: String,

    /// Channel whose analysis job to control
    #[arg(long, env = "HARMONY_CHANNEL_ID")]
    channel: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "harmony_cli=info,harmony_observer=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        base_url: cli.base_url,
        channel: ChannelId::parse(&cli.channel).context("Invalid --channel")?,
    };

    handle_command(cli.command, &config).await
}
