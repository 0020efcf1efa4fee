//! Session domain types and the session store trait.
//!
//! A session is a durable conversation thread. By convention one session
//! corresponds to at most one role name: the session title equals the role
//! name (trim-compared). Sessions are created by the resolver on first
//! contact with a role and are never deleted by this engine.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// A persisted conversation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque session id.
    pub id: String,

    /// Session title; equals the role name for role-bound sessions.
    pub title: String,

    /// Session description, seeded from the role description.
    pub description: String,

    /// The initial system prompt for this session.
    pub system_role: String,

    /// Model this session was created for.
    pub model: String,

    /// Provider this session was created for.
    pub provider: String,

    /// When this session was created.
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a new session. The store assigns the id and
/// the creation timestamp.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub title: String,
    pub description: String,
    pub system_role: String,
    pub model: String,
    pub provider: String,
}

/// Durable session persistence.
///
/// Implementations: SQLite, in-memory (for testing). The store performs no
/// locking of its own; atomicity is per individual call.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// List all sessions, newest first.
    async fn list(&self) -> std::result::Result<Vec<Session>, StorageError>;

    /// Fetch a session by id.
    async fn get(&self, id: &str) -> std::result::Result<Option<Session>, StorageError>;

    /// Create a new session and return the stored record.
    async fn create(&self, session: NewSession)
        -> std::result::Result<Session, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_serialization_roundtrip() {
        let session = Session {
            id: "s1".into(),
            title: "张三".into(),
            description: "A friendly AI assistant".into(),
            system_role: "A friendly AI assistant".into(),
            model: "gpt-4o-mini".into(),
            provider: "openai".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&session).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back.title, "张三");
        assert_eq!(back.id, "s1");
    }
}
