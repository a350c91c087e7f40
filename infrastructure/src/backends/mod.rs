//! Chat backend adapters.
//!
//! Each participant's configuration names a provider; `build_backend`
//! returns the matching adapter behind the `ChatBackend` capability.

mod anthropic;
mod openai;

pub use anthropic::AnthropicBackend;
pub use openai::OpenAiBackend;

use conclave_application::ports::chat_backend::ChatBackend;
use conclave_domain::{ParticipantConfig, ProviderKind};
use thiserror::Error;

/// Errors detected while constructing a backend from configuration.
#[derive(Error, Debug)]
pub enum BackendBuildError {
    #[error("participant {id}: api key is empty")]
    MissingApiKey { id: String },
}

/// Construct the chat backend for a participant.
pub fn build_backend(config: &ParticipantConfig) -> Result<Box<dyn ChatBackend>, BackendBuildError> {
    if config.api_key.trim().is_empty() {
        return Err(BackendBuildError::MissingApiKey {
            id: config.id.to_string(),
        });
    }
    Ok(match config.provider {
        ProviderKind::Anthropic => Box::new(AnthropicBackend::new(config)),
        ProviderKind::OpenAi => Box::new(OpenAiBackend::new(config)),
    })
}
