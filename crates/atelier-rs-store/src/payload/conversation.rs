//! Chat conversation payloads.

use crate::record::{Payload, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    /// Wire name for the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One message inside a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: RecordId,
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub(crate) fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: RecordId::from(Uuid::new_v4().to_string()),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// Conversation with its messages, oldest message first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    pub title: String,
    pub model: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(title: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            model: model.into(),
            messages: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Number of messages.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

impl Payload for Conversation {
    fn search_text(&self) -> &str {
        &self.title
    }
}
