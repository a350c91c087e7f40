//! Chat backend port
//!
//! Defines the interface for completing a conversation against an LLM
//! provider.

use async_trait::async_trait;
use conclave_domain::HistoryMessage;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during a backend completion call
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider rejected the request: {0}")]
    Rejected(String),

    #[error("empty response from provider")]
    EmptyResponse,

    #[error("{0}")]
    Other(String),
}

/// Capability of completing a role-tagged message history.
///
/// Implementations (HTTP adapters, mocks) live in the infrastructure
/// layer. A call must not outlive `deadline`; the reactor additionally
/// enforces the deadline on its side, so a sloppy adapter cannot wedge a
/// participant.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(
        &self,
        history: &[HistoryMessage],
        deadline: Duration,
    ) -> Result<String, BackendError>;
}

/// In-memory backend returning a fixed reply. Used in tests and as a
/// stand-in participant.
pub struct StaticBackend {
    reply: String,
}

impl StaticBackend {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl ChatBackend for StaticBackend {
    async fn complete(
        &self,
        _history: &[HistoryMessage],
        _deadline: Duration,
    ) -> Result<String, BackendError> {
        Ok(self.reply.clone())
    }
}
