//! Error types for the observer

use harmony_client::TransportError;
use harmony_core::domain::error::ValidationError;
use thiserror::Error;

/// Result type alias for command operations
pub type Result<T> = std::result::Result<T, CommandError>;

/// Why a command did not reach the server or was refused by it
#[derive(Debug, Error)]
pub enum CommandError {
    /// Rejected locally; no request was made
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request was made and failed
    #[error("{command} command failed: {source}")]
    Transport {
        command: &'static str,
        #[source]
        source: TransportError,
    },
}

impl CommandError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
