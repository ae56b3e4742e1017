//! Watch command
//!
//! Observes the job and prints every state change, stage or progress
//! movement and new diagnostic until Ctrl-C.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use harmony_core::domain::job::{JobState, StageScale};
use harmony_core::domain::observation::JobSnapshot;
use harmony_observer::config::STALENESS_FACTOR;
use harmony_observer::{Backoff, Config as ObserverConfig, JobObserver};
use std::time::Duration;
use tracing::info;

use crate::config::Config;

/// Watch tuning flags
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Progress poll interval in milliseconds
    #[arg(long, env = "HARMONY_PROGRESS_INTERVAL_MS", default_value_t = 250)]
    progress_interval_ms: u64,

    /// Stage poll interval in milliseconds
    #[arg(long, env = "HARMONY_STAGE_INTERVAL_MS", default_value_t = 250)]
    stage_interval_ms: u64,

    /// Treat the job as unknown after this long without a stage update (default: 3x stage interval)
    #[arg(long, env = "HARMONY_STALENESS_MS")]
    staleness_ms: Option<u64>,

    /// First stage value that counts as complete
    #[arg(long, env = "HARMONY_COMPLETION_STAGE", default_value_t = StageScale::DEFAULT_COMPLETION_STAGE)]
    completion_stage: i64,

    /// Fail poll requests slower than this many milliseconds
    #[arg(long, env = "HARMONY_REQUEST_TIMEOUT_MS")]
    request_timeout_ms: Option<u64>,

    /// First delay after a failed poll, doubling per consecutive failure
    #[arg(long, env = "HARMONY_BACKOFF_INITIAL_MS", requires = "backoff_max_ms")]
    backoff_initial_ms: Option<u64>,

    /// Longest delay between polls of a failing stream
    #[arg(long, env = "HARMONY_BACKOFF_MAX_MS", requires = "backoff_initial_ms")]
    backoff_max_ms: Option<u64>,

    /// Exit once the job is complete or stopped
    #[arg(long)]
    exit_when_settled: bool,
}

impl WatchArgs {
    fn observer_config(&self, config: &Config) -> ObserverConfig {
        let mut observer = ObserverConfig::new(config.base_url.clone(), config.channel.clone());
        observer.progress_interval = Duration::from_millis(self.progress_interval_ms);
        observer.stage_interval = Duration::from_millis(self.stage_interval_ms);
        observer.staleness_threshold = self
            .staleness_ms
            .map(Duration::from_millis)
            .unwrap_or(observer.stage_interval * STALENESS_FACTOR);
        observer.stage_scale = StageScale::new(self.completion_stage);
        observer.request_timeout = self.request_timeout_ms.map(Duration::from_millis);
        observer.backoff = match (self.backoff_initial_ms, self.backoff_max_ms) {
            (Some(initial), Some(max)) => Some(Backoff {
                initial: Duration::from_millis(initial),
                max: Duration::from_millis(max),
            }),
            _ => None,
        };
        observer
    }
}

pub async fn watch(args: WatchArgs, config: &Config) -> Result<()> {
    let mut observer = JobObserver::new(args.observer_config(config))
        .context("Invalid watch configuration")?;
    let mut updates = observer.subscribe();

    println!(
        "{}",
        format!("Watching channel {} (Ctrl-C to stop)", config.channel).bold()
    );
    observer.start_observing();

    let mut last = JobSnapshot::default();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                print_changes(&last, &snapshot);
                let settled = snapshot.state.is_settled();
                last = snapshot;
                if args.exit_when_settled && settled {
                    break;
                }
            }
        }
    }

    observer.stop_observing();
    info!("Stopped watching channel {}", config.channel);
    Ok(())
}

/// Print what differs between two snapshots
fn print_changes(previous: &JobSnapshot, current: &JobSnapshot) {
    let stage = current.observation.stage();
    let progress = current.observation.progress();

    if current.state != previous.state
        || stage != previous.observation.stage()
        || progress != previous.observation.progress()
    {
        println!(
            "{} {:<9} stage {:>3}  progress {:>4}",
            chrono_now().dimmed(),
            colorize_state(current.state),
            display_value(stage),
            progress
                .map(|p| format!("{}%", p))
                .unwrap_or_else(|| "-".to_string()),
        );
    }

    for diagnostic in &current.diagnostics {
        if !previous.diagnostics.contains(diagnostic) {
            println!("{} {} {}", chrono_now().dimmed(), "⚠".yellow(), diagnostic);
        }
    }

    let failing = current.failures.stage.consecutive_failures > 0;
    let was_failing = previous.failures.stage.consecutive_failures > 0;
    if failing && !was_failing {
        println!("{} {} stage poll failing", chrono_now().dimmed(), "✗".red());
    } else if was_failing && !failing {
        println!("{} {} stage poll recovered", chrono_now().dimmed(), "✓".green());
    }
}

fn display_value(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn chrono_now() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// Colorize job state for display
fn colorize_state(state: JobState) -> colored::ColoredString {
    let state_str = state.to_string();
    match state {
        JobState::Idle => state_str.yellow(),
        JobState::Running => state_str.cyan(),
        JobState::Complete => state_str.green(),
        JobState::Stopped => state_str.dimmed(),
        JobState::Unknown => state_str.red(),
    }
}
