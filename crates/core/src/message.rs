//! Message domain types and the message store trait.
//!
//! Each turn persists exactly one user message and one assistant message.
//! The assistant message starts as a placeholder holding the loading
//! sentinel and is the single mutable record updated as the stream
//! progresses: its content only ever grows, until either the final full
//! content (success) or a populated error field (failure).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Placeholder content for an assistant message before any delta arrives.
pub const LOADING_SENTINEL: &str = "...";

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// System instructions (role description, context)
    System,
}

/// Terminal error recorded on a failed assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageError {
    /// Stable error code, e.g. `502_RUNTIME_STREAM_ERROR`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

/// A persisted message record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message id.
    pub id: String,

    /// Owning session.
    pub session_id: String,

    /// Optional topic sub-grouping, carried through opaquely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,

    /// For assistant messages, the user message that started the turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Who sent this message.
    pub role: MessageRole,

    /// The text content. For a streaming assistant message this is the
    /// cumulative snapshot flushed so far.
    pub content: String,

    /// Which model generated this message (assistant only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_model: Option<String>,

    /// Which provider generated this message (assistant only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_provider: Option<String>,

    /// Terminal error, populated only on failed turns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<MessageError>,

    /// When this message was created.
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a new message. The store assigns the id and
/// the creation timestamp.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub session_id: String,
    pub topic_id: Option<String>,
    pub parent_id: Option<String>,
    pub role: MessageRole,
    pub content: String,
    pub from_model: Option<String>,
    pub from_provider: Option<String>,
}

/// The minimal `{role, content}` shape sent to model providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: MessageRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: MessageRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: MessageRole::Assistant, content: content.into() }
    }
}

/// Durable message persistence.
///
/// Every call is a durable write; there is no buffering layer inside the
/// store. `update_content` stores whole-content snapshots, not diffs.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Create a new message and return the stored record.
    async fn create(&self, message: NewMessage)
        -> std::result::Result<Message, StorageError>;

    /// Overwrite a message's content with the cumulative text so far.
    /// Idempotent for a given snapshot.
    async fn update_content(
        &self,
        id: &str,
        content: &str,
    ) -> std::result::Result<(), StorageError>;

    /// Record a terminal error on a message without altering its content.
    async fn mark_failed(
        &self,
        id: &str,
        error: MessageError,
    ) -> std::result::Result<(), StorageError>;

    /// All messages for a session (and topic, when given), oldest first.
    async fn list_for_session(
        &self,
        session_id: &str,
        topic_id: Option<&str>,
    ) -> std::result::Result<Vec<Message>, StorageError>;

    /// Fetch a message by id.
    async fn get(&self, id: &str) -> std::result::Result<Option<Message>, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&MessageRole::User).unwrap(), r#""user""#);
        assert_eq!(
            serde_json::to_string(&MessageRole::Assistant).unwrap(),
            r#""assistant""#
        );
    }

    #[test]
    fn chat_message_constructors() {
        let msg = ChatMessage::system("you are 张三");
        assert_eq!(msg.role, MessageRole::System);
        assert_eq!(msg.content, "you are 张三");
    }

    #[test]
    fn message_serialization_skips_empty_options() {
        let msg = Message {
            id: "m1".into(),
            session_id: "s1".into(),
            topic_id: None,
            parent_id: None,
            role: MessageRole::User,
            content: "hello".into(),
            from_model: None,
            from_provider: None,
            error: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("topic_id"));
        assert!(!json.contains("error"));
    }

    #[test]
    fn message_error_roundtrip() {
        let err = MessageError {
            code: "502_RUNTIME_STREAM_ERROR".into(),
            message: "stream died".into(),
        };
        let json = serde_json::to_string(&err).unwrap();
        let back: MessageError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }
}
