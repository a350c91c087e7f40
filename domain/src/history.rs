//! Role-tagged conversation history fed to chat backends.

use serde::{Deserialize, Serialize};

use crate::message::{Message, MessageType};

/// Role of a message in a backend conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single role-tagged message handed to a backend (Value Object)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: Role,
    pub content: String,
}

impl HistoryMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Map transcript records onto a backend conversation, in transcript order.
///
/// Backends carry no authorship channel for assistant turns, so when
/// `label_authors` is set the author id of each assistant record is
/// prepended to its content.
pub fn history_from_transcript(records: &[Message], label_authors: bool) -> Vec<HistoryMessage> {
    records
        .iter()
        .map(|record| match record.kind {
            MessageType::User => HistoryMessage::user(record.content.clone()),
            MessageType::System => HistoryMessage::system(record.content.clone()),
            MessageType::Assistant => {
                if label_authors {
                    HistoryMessage::assistant(format!("[{}] {}", record.from, record.content))
                } else {
                    HistoryMessage::assistant(record.content.clone())
                }
            }
        })
        .collect()
}
