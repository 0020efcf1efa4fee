//! In-memory store — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use chrono::Utc;
use rolechat_core::error::StorageError;
use rolechat_core::message::{Message, MessageError, MessageStore, NewMessage};
use rolechat_core::session::{NewSession, Session, SessionStore};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// An in-memory store holding sessions and messages in Vecs.
/// Useful for testing and runs where persistence isn't needed.
#[derive(Clone)]
pub struct InMemoryStore {
    sessions: Arc<RwLock<Vec<Session>>>,
    messages: Arc<RwLock<Vec<Message>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(Vec::new())),
            messages: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn list(&self) -> Result<Vec<Session>, StorageError> {
        let mut sessions = self.sessions.read().await.clone();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    async fn get(&self, id: &str) -> Result<Option<Session>, StorageError> {
        Ok(self.sessions.read().await.iter().find(|s| s.id == id).cloned())
    }

    async fn create(&self, session: NewSession) -> Result<Session, StorageError> {
        let stored = Session {
            id: Uuid::new_v4().to_string(),
            title: session.title,
            description: session.description,
            system_role: session.system_role,
            model: session.model,
            provider: session.provider,
            created_at: Utc::now(),
        };
        self.sessions.write().await.push(stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    async fn create(&self, message: NewMessage) -> Result<Message, StorageError> {
        let stored = Message {
            id: Uuid::new_v4().to_string(),
            session_id: message.session_id,
            topic_id: message.topic_id,
            parent_id: message.parent_id,
            role: message.role,
            content: message.content,
            from_model: message.from_model,
            from_provider: message.from_provider,
            error: None,
            created_at: Utc::now(),
        };
        self.messages.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn update_content(&self, id: &str, content: &str) -> Result<(), StorageError> {
        let mut messages = self.messages.write().await;
        let msg = messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| StorageError::NotFound(format!("message {id}")))?;
        msg.content = content.to_string();
        Ok(())
    }

    async fn mark_failed(&self, id: &str, error: MessageError) -> Result<(), StorageError> {
        let mut messages = self.messages.write().await;
        let msg = messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| StorageError::NotFound(format!("message {id}")))?;
        msg.error = Some(error);
        Ok(())
    }

    async fn list_for_session(
        &self,
        session_id: &str,
        topic_id: Option<&str>,
    ) -> Result<Vec<Message>, StorageError> {
        let messages = self.messages.read().await;
        let mut result: Vec<Message> = messages
            .iter()
            .filter(|m| m.session_id == session_id && m.topic_id.as_deref() == topic_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(result)
    }

    async fn get(&self, id: &str) -> Result<Option<Message>, StorageError> {
        Ok(self.messages.read().await.iter().find(|m| m.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolechat_core::message::{MessageRole, LOADING_SENTINEL};

    fn new_session() -> NewSession {
        NewSession {
            title: "张三".into(),
            description: "A friendly AI assistant".into(),
            system_role: "A friendly AI assistant".into(),
            model: "gpt-4o-mini".into(),
            provider: "openai".into(),
        }
    }

    fn user_message(session_id: &str, content: &str) -> NewMessage {
        NewMessage {
            session_id: session_id.into(),
            topic_id: None,
            parent_id: None,
            role: MessageRole::User,
            content: content.into(),
            from_model: None,
            from_provider: None,
        }
    }

    #[tokio::test]
    async fn create_and_list_sessions() {
        let store = InMemoryStore::new();
        let created = SessionStore::create(&store, new_session()).await.unwrap();
        assert!(!created.id.is_empty());

        let sessions = SessionStore::list(&store).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].title, "张三");
    }

    #[tokio::test]
    async fn update_content_overwrites_snapshot() {
        let store = InMemoryStore::new();
        let session = SessionStore::create(&store, new_session()).await.unwrap();
        let msg = MessageStore::create(&store, user_message(&session.id, LOADING_SENTINEL))
            .await
            .unwrap();

        store.update_content(&msg.id, "Hi").await.unwrap();
        store.update_content(&msg.id, "Hi there").await.unwrap();

        let stored = MessageStore::get(&store, &msg.id).await.unwrap().unwrap();
        assert_eq!(stored.content, "Hi there");
    }

    #[tokio::test]
    async fn mark_failed_preserves_content() {
        let store = InMemoryStore::new();
        let session = SessionStore::create(&store, new_session()).await.unwrap();
        let msg = MessageStore::create(&store, user_message(&session.id, "partial"))
            .await
            .unwrap();

        store
            .mark_failed(
                &msg.id,
                MessageError { code: "502_RUNTIME_STREAM_ERROR".into(), message: "died".into() },
            )
            .await
            .unwrap();

        let stored = MessageStore::get(&store, &msg.id).await.unwrap().unwrap();
        assert_eq!(stored.content, "partial");
        assert_eq!(stored.error.unwrap().code, "502_RUNTIME_STREAM_ERROR");
    }

    #[tokio::test]
    async fn list_for_session_filters_by_topic() {
        let store = InMemoryStore::new();
        let session = SessionStore::create(&store, new_session()).await.unwrap();

        let mut topical = user_message(&session.id, "in topic");
        topical.topic_id = Some("t1".into());
        MessageStore::create(&store, topical).await.unwrap();
        MessageStore::create(&store, user_message(&session.id, "no topic"))
            .await
            .unwrap();

        let with_topic = store.list_for_session(&session.id, Some("t1")).await.unwrap();
        assert_eq!(with_topic.len(), 1);
        assert_eq!(with_topic[0].content, "in topic");

        let without = store.list_for_session(&session.id, None).await.unwrap();
        assert_eq!(without.len(), 1);
        assert_eq!(without[0].content, "no topic");
    }

    #[tokio::test]
    async fn update_missing_message_is_not_found() {
        let store = InMemoryStore::new();
        let result = store.update_content("nope", "x").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }
}
