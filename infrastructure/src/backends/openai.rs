//! OpenAI chat completions backend.

use std::time::Duration;

use async_trait::async_trait;
use conclave_application::ports::chat_backend::{BackendError, ChatBackend};
use conclave_domain::util::truncate_str;
use conclave_domain::{HistoryMessage, ParticipantConfig, Role};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Backend talking to the OpenAI chat completions API (and compatible
/// endpoints).
pub struct OpenAiBackend {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiBackend {
    pub fn new(config: &ParticipantConfig) -> Self {
        let base_url = config
            .base_url
            .clone()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            base_url,
            model: config.model.clone(),
        }
    }

    fn convert(history: &[HistoryMessage]) -> Vec<WireMessage> {
        history
            .iter()
            .map(|msg| WireMessage {
                role: match msg.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                content: msg.content.clone(),
            })
            .collect()
    }
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [WireMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn complete(
        &self,
        history: &[HistoryMessage],
        deadline: Duration,
    ) -> Result<String, BackendError> {
        let messages = Self::convert(history);
        let request = CompletionRequest {
            model: &self.model,
            messages: &messages,
        };

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        debug!(model = %self.model, turns = messages.len(), "openai completion request");

        let response = self
            .client
            .post(&url)
            .timeout(deadline)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout
                } else {
                    BackendError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Rejected(format!(
                "{}: {}",
                status,
                truncate_str(&body, 512)
            )));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .filter_map(|choice| choice.message.content)
            .find(|content| !content.is_empty())
            .ok_or(BackendError::EmptyResponse)
    }
}
