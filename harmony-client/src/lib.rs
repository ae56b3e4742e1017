//! Harmony HTTP Client
//!
//! Client for the channel analysis server: a [`Transport`] that issues
//! requests under a fixed base URL, and a [`ChannelClient`] exposing the
//! typed job endpoints of one channel.
//!
//! # Example
//!
//! ```no_run
//! use harmony_client::ChannelClient;
//! use harmony_core::domain::channel::ChannelId;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let channel = ChannelId::parse("979554513021177909")?;
//!     let client = ChannelClient::http("http://localhost:5000", channel);
//!
//!     client.start().await?;
//!     println!("stage: {}", client.get_stage().await?);
//!     Ok(())
//! }
//! ```

mod channel;
pub mod error;
mod transport;

// Re-export commonly used types
pub use channel::ChannelClient;
pub use error::{Result, TransportError};
pub use transport::{HttpTransport, Method, Transport};
