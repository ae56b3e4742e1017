//! Harmony Observer
//!
//! Client-side controller for a channel's server-side sentiment analysis job.
//!
//! Architecture:
//! - Configuration: endpoint root, channel, intervals and staleness
//! - Scheduler: cancellable periodic tasks and the progress/stage poll streams
//! - Services: observation store, state reconciler, command issuer
//! - Observer: the session facade a presentation layer talks to
//!
//! Commands and observation never share state: a command's effect is only
//! seen through the next poll.
//!
//! # Example
//!
//! ```no_run
//! use harmony_core::domain::channel::ChannelId;
//! use harmony_observer::{Config, JobObserver};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let channel = ChannelId::parse("979554513021177909")?;
//!     let mut observer = JobObserver::new(Config::new("http://localhost:5000".into(), channel))?;
//!
//!     observer.start_observing();
//!     observer.commands().start().await?;
//!
//!     let mut updates = observer.subscribe();
//!     while updates.changed().await.is_ok() {
//!         let snapshot = updates.borrow().clone();
//!         println!("{} (progress {:?})", snapshot.state, snapshot.observation.progress());
//!         if snapshot.state.is_settled() {
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
mod observer;
pub mod scheduler;
pub mod service;

pub use config::{Backoff, Config};
pub use error::CommandError;
pub use observer::JobObserver;
pub use service::commands::CommandIssuer;
