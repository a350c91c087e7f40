//! Message entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::util::uuid_v4;

/// Kind of a transcript record.
///
/// Governs the relevance filter: every participant reacts to `user`
/// records, while `assistant` and `system` records only demand a response
/// when they mention or reply to a specific participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    User,
    Assistant,
    System,
}

/// A single message in a council discussion (Entity).
///
/// Messages are immutable once appended to the transcript. The transcript's
/// append order is the canonical ordering of a session; `timestamp` is
/// informational only and never used for ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique id within a session.
    pub id: String,
    /// Sender identity: `"user"`, `"host"`, or a participant id.
    pub from: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub content: String,
    #[serde(default = "epoch")]
    pub timestamp: DateTime<Utc>,
    /// Directed reply marker: the id of the message this one answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    /// Fields this version does not know about, preserved across a
    /// decode/encode cycle.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

impl Message {
    /// Create a new message with a fresh id and the current wall clock.
    pub fn new(from: impl Into<String>, kind: MessageType, content: impl Into<String>) -> Self {
        Self {
            id: uuid_v4(),
            from: from.into(),
            kind,
            content: content.into(),
            timestamp: Utc::now(),
            reply_to: None,
            extra: Map::new(),
        }
    }

    /// A human turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(crate::participant::USER_ID, MessageType::User, content)
    }

    /// A model reply.
    pub fn assistant(from: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(from, MessageType::Assistant, content)
    }

    /// A diagnostic or housekeeping record.
    pub fn system(from: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(from, MessageType::System, content)
    }

    /// Mark this message as a directed reply to `id`.
    pub fn in_reply_to(mut self, id: impl Into<String>) -> Self {
        self.reply_to = Some(id.into());
        self
    }

    /// Whether the content contains an `@<participant_id>` mention.
    pub fn is_mentioned(&self, participant_id: &str) -> bool {
        self.content.contains(&format!("@{}", participant_id))
    }
}
