//! Job identity

use serde::{Deserialize, Serialize};

use crate::domain::error::ValidationError;

/// Identifier of the channel whose message history is being analyzed
///
/// Every request a client session makes is scoped to one `ChannelId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelId(String);

impl ChannelId {
    /// Parse a channel id, rejecting values that cannot form a path segment
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let valid = !trimmed.is_empty()
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if valid {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(ValidationError::InvalidChannelId(input.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ChannelId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ChannelId> for String {
    fn from(id: ChannelId) -> Self {
        id.0
    }
}

impl std::str::FromStr for ChannelId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_snowflake() {
        let id = ChannelId::parse("979554513021177909").unwrap();
        assert_eq!(id.as_str(), "979554513021177909");
        assert_eq!(id.to_string(), "979554513021177909");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let id = ChannelId::parse("  general ").unwrap();
        assert_eq!(id.as_str(), "general");
    }

    #[test]
    fn test_parse_rejects_path_characters() {
        assert!(ChannelId::parse("").is_err());
        assert!(ChannelId::parse("   ").is_err());
        assert!(ChannelId::parse("a/b").is_err());
        assert!(ChannelId::parse("..").is_err());
        assert!(ChannelId::parse("a?b=1").is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let id: ChannelId = serde_json::from_str("\"979554513021177909\"").unwrap();
        assert_eq!(id.as_str(), "979554513021177909");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"979554513021177909\"");

        assert!(serde_json::from_str::<ChannelId>("\"../admin\"").is_err());
        assert!(serde_json::from_str::<ChannelId>("\"\"").is_err());
    }
}
