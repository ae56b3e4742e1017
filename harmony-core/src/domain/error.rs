//! Validation errors raised before anything is sent to the server

use thiserror::Error;

/// Input rejected locally, without making a request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// `SetLimit` requires a positive message limit
    #[error("limit must be a positive integer, got {0}")]
    NonPositiveLimit(i64),

    /// Channel identifiers are non-empty and usable as a single path segment
    #[error("invalid channel id {0:?}")]
    InvalidChannelId(String),

    /// Alternate name lists need a user and at least one non-empty name
    #[error("invalid alternates: {0}")]
    InvalidAlternates(String),
}
