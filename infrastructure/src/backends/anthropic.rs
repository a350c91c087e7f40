//! Anthropic messages API backend.

use std::time::Duration;

use async_trait::async_trait;
use conclave_application::ports::chat_backend::{BackendError, ChatBackend};
use conclave_domain::util::truncate_str;
use conclave_domain::{HistoryMessage, ParticipantConfig, Role};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4000;

/// Backend talking to the Anthropic messages API (and compatible
/// endpoints).
pub struct AnthropicBackend {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl AnthropicBackend {
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

    /// Split the history into the Anthropic wire shape: system turns feed
    /// the top-level `system` field, everything else alternates as
    /// messages.
    fn convert(history: &[HistoryMessage]) -> (Option<String>, Vec<WireMessage>) {
        let mut system = String::new();
        let mut messages = Vec::new();
        for msg in history {
            match msg.role {
                Role::System => {
                    if !system.is_empty() {
                        system.push('\n');
                    }
                    system.push_str(&msg.content);
                }
                Role::User => messages.push(WireMessage {
                    role: "user",
                    content: msg.content.clone(),
                }),
                Role::Assistant => messages.push(WireMessage {
                    role: "assistant",
                    content: msg.content.clone(),
                }),
            }
        }
        ((!system.is_empty()).then_some(system), messages)
    }
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    messages: &'a [WireMessage],
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl ChatBackend for AnthropicBackend {
    async fn complete(
        &self,
        history: &[HistoryMessage],
        deadline: Duration,
    ) -> Result<String, BackendError> {
        let (system, messages) = Self::convert(history);
        let request = MessagesRequest {
            model: &self.model,
            messages: &messages,
            max_tokens: MAX_TOKENS,
            system: system.as_deref(),
        };

        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        debug!(model = %self.model, turns = messages.len(), "anthropic completion request");

        let response = self
            .client
            .post(&url)
            .timeout(deadline)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
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

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        parsed
            .content
            .into_iter()
            .map(|block| block.text)
            .find(|text| !text.is_empty())
            .ok_or(BackendError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_turns_feed_the_system_field() {
        let history = vec![
            HistoryMessage::system("be brief"),
            HistoryMessage::user("hi"),
            HistoryMessage::assistant("[gpt] hello"),
        ];
        let (system, messages) = AnthropicBackend::convert(&history);
        assert_eq!(system.as_deref(), Some("be brief"));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[1].role, "assistant");
    }

    #[test]
    fn no_system_field_without_system_turns() {
        let history = vec![HistoryMessage::user("hi")];
        let (system, _) = AnthropicBackend::convert(&history);
        assert!(system.is_none());
    }

    #[test]
    fn request_serializes_without_empty_system() {
        let messages = vec![WireMessage {
            role: "user",
            content: "hi".to_string(),
        }];
        let request = MessagesRequest {
            model: "claude-sonnet-4-5",
            messages: &messages,
            max_tokens: MAX_TOKENS,
            system: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
