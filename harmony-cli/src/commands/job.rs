//! Job command handlers
//!
//! One request per invocation; the result of the command shows up in
//! `harmony watch`, not here.

use anyhow::Result;
use colored::*;
use harmony_client::ChannelClient;
use harmony_observer::CommandIssuer;
use harmony_observer::service::IntentLog;

use crate::config::Config;

fn client(config: &Config) -> ChannelClient {
    ChannelClient::http(config.base_url.clone(), config.channel.clone())
}

fn issuer(config: &Config) -> CommandIssuer {
    CommandIssuer::new(client(config), IntentLog::new())
}

pub async fn start(config: &Config) -> Result<()> {
    issuer(config).start().await?;
    println!(
        "{} Analysis start requested for channel {}",
        "✓".green(),
        config.channel.to_string().cyan()
    );
    Ok(())
}

pub async fn stop(config: &Config) -> Result<()> {
    issuer(config).stop().await?;
    println!(
        "{} Analysis stop requested for channel {}",
        "✓".green(),
        config.channel.to_string().cyan()
    );
    Ok(())
}

pub async fn set_limit(config: &Config, limit: i64) -> Result<()> {
    issuer(config).set_limit(limit).await?;
    println!("{} Message limit set to {}", "✓".green(), limit.to_string().bold());
    Ok(())
}

pub async fn get_limit(config: &Config) -> Result<()> {
    let limit = client(config).get_limit().await?;
    if limit > 0 {
        println!("Message limit: {}", limit.to_string().bold());
    } else {
        println!("{}", "No message limit set.".yellow());
    }
    Ok(())
}
