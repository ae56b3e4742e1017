//! User alternate name handlers

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use harmony_client::ChannelClient;
use harmony_core::dto::UserAlternates;

use crate::config::Config;

/// Alternate name subcommands
#[derive(Subcommand)]
pub enum AltsCommands {
    /// List alternate names per user
    List,
    /// Add alternate names for a user
    Add {
        /// User id
        user_id: String,
        /// Names the user goes by
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Remove alternate names for a user
    Remove {
        /// User id
        user_id: String,
        /// Names to remove
        #[arg(required = true)]
        names: Vec<String>,
    },
}

pub async fn handle_alts_command(command: AltsCommands, config: &Config) -> Result<()> {
    let client = ChannelClient::http(config.base_url.clone(), config.channel.clone());

    match command {
        AltsCommands::List => list_alternates(&client).await,
        AltsCommands::Add { user_id, names } => {
            let alts = UserAlternates { user_id, names };
            alts.validate()?;
            client.add_alternates(std::slice::from_ref(&alts)).await?;
            println!(
                "{} Added {} name(s) for user {}",
                "✓".green(),
                alts.names.len(),
                alts.user_id.cyan()
            );
            Ok(())
        }
        AltsCommands::Remove { user_id, names } => {
            let alts = UserAlternates { user_id, names };
            alts.validate()?;
            client.remove_alternates(std::slice::from_ref(&alts)).await?;
            println!(
                "{} Removed {} name(s) for user {}",
                "✓".green(),
                alts.names.len(),
                alts.user_id.cyan()
            );
            Ok(())
        }
    }
}

async fn list_alternates(client: &ChannelClient) -> Result<()> {
    let listing = client.list_alternates().await?;

    if listing.is_empty() {
        println!("{}", "No alternates found.".yellow());
        return Ok(());
    }

    let mut users: Vec<_> = listing.into_iter().collect();
    users.sort_by(|a, b| a.0.cmp(&b.0));

    println!("{}", format!("Alternates for {} user(s):", users.len()).bold());
    for (user_id, names) in users {
        println!("  {} {}: {}", "▸".cyan(), user_id, names.join(", ").dimmed());
    }
    Ok(())
}
