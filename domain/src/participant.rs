//! Participant identity and configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Sender id reserved for the human user.
pub const USER_ID: &str = "user";

/// Default sender id of the host front-end.
pub const HOST_ID: &str = "host";

/// Identity of a council participant (Value Object).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<T: Into<String>> From<T> for ParticipantId {
    fn from(s: T) -> Self {
        Self(s.into())
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Supported chat backend providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Anthropic,
    OpenAi,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error for a provider name with no matching adapter.
#[derive(Error, Debug)]
#[error("unknown provider: {0}")]
pub struct UnknownProviderError(pub String);

impl FromStr for ProviderKind {
    type Err = UnknownProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anthropic" => Ok(ProviderKind::Anthropic),
            "openai" => Ok(ProviderKind::OpenAi),
            other => Err(UnknownProviderError(other.to_string())),
        }
    }
}

/// Immutable configuration of a single council participant.
///
/// Constructed once at startup; the participant table never changes while
/// a session runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantConfig {
    pub id: ParticipantId,
    /// Human-readable display name.
    pub name: String,
    pub provider: ProviderKind,
    pub api_key: String,
    /// Provider endpoint override; the adapter default when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Model tag passed to the provider.
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_round_trip() {
        for kind in [ProviderKind::Anthropic, ProviderKind::OpenAi] {
            let parsed: ProviderKind = kind.as_str().parse().unwrap();
            assert_eq!(kind, parsed);
        }
    }

    #[test]
    fn unknown_provider_is_an_error() {
        let err = "google".parse::<ProviderKind>().unwrap_err();
        assert!(err.to_string().contains("google"));
    }

    #[test]
    fn participant_id_from_str() {
        let id = ParticipantId::from("claude");
        assert_eq!(id.as_str(), "claude");
        assert_eq!(id.to_string(), "claude");
    }
}
