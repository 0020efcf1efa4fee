//! Turn-scoped message persistence.
//!
//! The ledger wraps the message store with the engine's write discipline:
//! one user message per turn, one assistant placeholder that only ever grows
//! (or gains a terminal error), and a history view that maps prior records
//! into the minimal provider shape.

use rolechat_core::error::{Error, Result};
use rolechat_core::message::{
    ChatMessage, Message, MessageError, MessageRole, MessageStore, NewMessage, LOADING_SENTINEL,
};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct MessageLedger {
    messages: Arc<dyn MessageStore>,
}

impl MessageLedger {
    pub fn new(messages: Arc<dyn MessageStore>) -> Self {
        Self { messages }
    }

    /// Persist the user's message. Rejects whitespace-only content before
    /// anything is written.
    pub async fn create_user_message(
        &self,
        session_id: &str,
        topic_id: Option<String>,
        content: &str,
    ) -> Result<Message> {
        if content.trim().is_empty() {
            return Err(Error::Validation { message: "user message must not be empty".into() });
        }

        let message = self
            .messages
            .create(NewMessage {
                session_id: session_id.to_string(),
                topic_id,
                parent_id: None,
                role: MessageRole::User,
                content: content.to_string(),
                from_model: None,
                from_provider: None,
            })
            .await?;
        Ok(message)
    }

    /// Persist the assistant placeholder holding the loading sentinel. Its
    /// id is the one all later stream writes target.
    pub async fn create_assistant_placeholder(
        &self,
        session_id: &str,
        topic_id: Option<String>,
        parent_id: &str,
        model: &str,
        provider: &str,
    ) -> Result<Message> {
        let message = self
            .messages
            .create(NewMessage {
                session_id: session_id.to_string(),
                topic_id,
                parent_id: Some(parent_id.to_string()),
                role: MessageRole::Assistant,
                content: LOADING_SENTINEL.to_string(),
                from_model: Some(model.to_string()),
                from_provider: Some(provider.to_string()),
            })
            .await?;
        Ok(message)
    }

    /// Overwrite the assistant message with the cumulative text so far.
    pub async fn append_delta(&self, message_id: &str, full_text: &str) -> Result<()> {
        self.messages.update_content(message_id, full_text).await?;
        Ok(())
    }

    /// Record a terminal error on the assistant message. Already-persisted
    /// partial content stays in place.
    pub async fn mark_failed(&self, message_id: &str, code: &str, message: &str) -> Result<()> {
        debug!(message_id, code, "Marking assistant message failed");
        self.messages
            .mark_failed(
                message_id,
                MessageError { code: code.to_string(), message: message.to_string() },
            )
            .await?;
        Ok(())
    }

    /// Prior turn history for the prompt, oldest first, mapped to the
    /// minimal `{role, content}` shape. Records in `exclude` (the current
    /// turn's own messages) and empty-content records are dropped.
    pub async fn history(
        &self,
        session_id: &str,
        topic_id: Option<&str>,
        exclude: &[&str],
    ) -> Result<Vec<ChatMessage>> {
        let records = self.messages.list_for_session(session_id, topic_id).await?;
        Ok(records
            .into_iter()
            .filter(|m| !exclude.contains(&m.id.as_str()))
            .filter(|m| !m.content.is_empty())
            .map(|m| ChatMessage { role: m.role, content: m.content })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolechat_storage::in_memory::InMemoryStore;

    fn ledger() -> (MessageLedger, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (MessageLedger::new(store.clone()), store)
    }

    #[tokio::test]
    async fn rejects_empty_user_message() {
        let (ledger, store) = ledger();
        let result = ledger.create_user_message("s1", None, "   ").await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        assert!(store.list_for_session("s1", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn placeholder_carries_sentinel_and_parent() {
        let (ledger, _) = ledger();
        let user = ledger.create_user_message("s1", None, "hello").await.unwrap();
        let placeholder = ledger
            .create_assistant_placeholder("s1", None, &user.id, "gpt-4o-mini", "openai")
            .await
            .unwrap();

        assert_eq!(placeholder.content, LOADING_SENTINEL);
        assert_eq!(placeholder.parent_id.as_deref(), Some(user.id.as_str()));
        assert_eq!(placeholder.from_model.as_deref(), Some("gpt-4o-mini"));
    }

    #[tokio::test]
    async fn append_delta_overwrites_with_snapshot() {
        let (ledger, store) = ledger();
        let user = ledger.create_user_message("s1", None, "hello").await.unwrap();
        let placeholder = ledger
            .create_assistant_placeholder("s1", None, &user.id, "m", "p")
            .await
            .unwrap();

        ledger.append_delta(&placeholder.id, "Hi").await.unwrap();
        ledger.append_delta(&placeholder.id, "Hi there").await.unwrap();

        let stored = MessageStore::get(store.as_ref(), &placeholder.id).await.unwrap().unwrap();
        assert_eq!(stored.content, "Hi there");
    }

    #[tokio::test]
    async fn mark_failed_keeps_partial_content() {
        let (ledger, store) = ledger();
        let user = ledger.create_user_message("s1", None, "hello").await.unwrap();
        let placeholder = ledger
            .create_assistant_placeholder("s1", None, &user.id, "m", "p")
            .await
            .unwrap();
        ledger.append_delta(&placeholder.id, "partial answ").await.unwrap();

        ledger
            .mark_failed(&placeholder.id, "502_RUNTIME_STREAM_ERROR", "stream died")
            .await
            .unwrap();

        let stored = MessageStore::get(store.as_ref(), &placeholder.id).await.unwrap().unwrap();
        assert_eq!(stored.content, "partial answ");
        assert_eq!(stored.error.unwrap().code, "502_RUNTIME_STREAM_ERROR");
    }

    #[tokio::test]
    async fn history_excludes_current_turn_and_empty_content() {
        let (ledger, store) = ledger();
        let old_user = ledger.create_user_message("s1", None, "earlier question").await.unwrap();
        let old_reply = ledger
            .create_assistant_placeholder("s1", None, &old_user.id, "m", "p")
            .await
            .unwrap();
        ledger.append_delta(&old_reply.id, "earlier answer").await.unwrap();
        // A record that ended up with no content at all must be filtered.
        let empty = ledger
            .create_assistant_placeholder("s1", None, &old_user.id, "m", "p")
            .await
            .unwrap();
        store.update_content(&empty.id, "").await.unwrap();

        let user = ledger.create_user_message("s1", None, "new question").await.unwrap();
        let placeholder = ledger
            .create_assistant_placeholder("s1", None, &user.id, "m", "p")
            .await
            .unwrap();

        let history = ledger
            .history("s1", None, &[user.id.as_str(), placeholder.id.as_str()])
            .await
            .unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "earlier question");
        assert_eq!(history[1].content, "earlier answer");
    }
}
