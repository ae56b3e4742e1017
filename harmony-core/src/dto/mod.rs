//! Data Transfer Objects
//!
//! Wire payloads of the analysis server's channel endpoints.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::error::ValidationError;
use crate::domain::job::Limit;

/// Body of `GET /api/channel/{id}/pog`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub progress: i64,
}

/// Body of `GET /api/channel/{id}/stage`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResponse {
    pub stage: i64,
}

/// Body of `PUT /api/channel/{id}/limit`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitRequest {
    pub limit: Limit,
}

/// Body of `GET /api/channel/{id}/limit`
///
/// The server reports 0 for channels that never had a limit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitResponse {
    pub limit: i64,
}

/// Alternate names a user goes by in the channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAlternates {
    pub user_id: String,
    pub names: Vec<String>,
}

impl UserAlternates {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.user_id.trim().is_empty() {
            return Err(ValidationError::InvalidAlternates(
                "user_id cannot be empty".to_string(),
            ));
        }
        if self.names.is_empty() || self.names.iter().any(|n| n.trim().is_empty()) {
            return Err(ValidationError::InvalidAlternates(format!(
                "user {} needs at least one non-empty name",
                self.user_id
            )));
        }
        Ok(())
    }
}

/// Body of `GET /api/channel/{id}/alts`: user id to alternate names
pub type AlternatesListing = HashMap<String, Vec<String>>;
