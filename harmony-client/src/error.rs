//! Error types for the Harmony client

use harmony_core::domain::error::ValidationError;
use thiserror::Error;

/// Result type alias for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors that can occur while talking to the analysis server
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[source] reqwest::Error),

    /// Server returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error body from the server
        message: String,
    },

    /// Response body was not the expected JSON
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Request did not complete within the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// Request body could not be encoded
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Input rejected before anything was sent
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::RequestFailed(err)
        }
    }
}

impl TransportError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if the request was rejected locally
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }
}
