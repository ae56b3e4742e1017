//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod alts;
mod job;
mod watch;

pub use alts::AltsCommands;
pub use watch::WatchArgs;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start (or continue) analysis
    Start,
    /// Stop analysis
    Stop,
    /// Set the maximum number of messages to analyze
    Limit {
        /// Positive message limit
        #[arg(allow_negative_numbers = true)]
        limit: i64,
    },
    /// Show the current message limit
    GetLimit,
    /// Manage user alternate names
    Alts {
        #[command(subcommand)]
        command: AltsCommands,
    },
    /// Poll progress and stage until interrupted
    Watch(WatchArgs),
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Start => job::start(config).await,
        Commands::Stop => job::stop(config).await,
        Commands::Limit { limit } => job::set_limit(config, limit).await,
        Commands::GetLimit => job::get_limit(config).await,
        Commands::Alts { command } => alts::handle_alts_command(command, config).await,
        Commands::Watch(args) => watch::watch(args, config).await,
    }
}
