//! SQLite store for sessions and messages.
//!
//! Uses a single SQLite database file with two tables:
//! - `sessions` — one row per conversation session
//! - `messages` — one row per persisted message, including the mutable
//!   assistant snapshot updated during streaming
//!
//! Timestamps are stored as RFC 3339 text. Schema is created at open.

use async_trait::async_trait;
use chrono::Utc;
use rolechat_core::error::StorageError;
use rolechat_core::message::{Message, MessageError, MessageRole, MessageStore, NewMessage};
use rolechat_core::session::{NewSession, Session, SessionStore};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

/// A durable SQLite store implementing both `SessionStore` and `MessageStore`.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at the given path.
    ///
    /// Pass `":memory:"` for an in-process ephemeral database (useful for tests).
    pub async fn new(path: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StorageError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StorageError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id          TEXT PRIMARY KEY,
                title       TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                system_role TEXT NOT NULL DEFAULT '',
                model       TEXT NOT NULL DEFAULT '',
                provider    TEXT NOT NULL DEFAULT '',
                created_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::MigrationFailed(format!("sessions table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id            TEXT PRIMARY KEY,
                session_id    TEXT NOT NULL REFERENCES sessions(id),
                topic_id      TEXT,
                parent_id     TEXT,
                role          TEXT NOT NULL,
                content       TEXT NOT NULL DEFAULT '',
                from_model    TEXT,
                from_provider TEXT,
                error_code    TEXT,
                error_message TEXT,
                created_at    TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::MigrationFailed(format!("messages table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::MigrationFailed(format!("messages index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<Session, StorageError> {
        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| StorageError::QueryFailed(format!("created_at column: {e}")))?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Session {
            id: row
                .try_get("id")
                .map_err(|e| StorageError::QueryFailed(format!("id column: {e}")))?,
            title: row
                .try_get("title")
                .map_err(|e| StorageError::QueryFailed(format!("title column: {e}")))?,
            description: row.try_get("description").unwrap_or_default(),
            system_role: row.try_get("system_role").unwrap_or_default(),
            model: row.try_get("model").unwrap_or_default(),
            provider: row.try_get("provider").unwrap_or_default(),
            created_at,
        })
    }

    fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> Result<Message, StorageError> {
        let role_str: String = row
            .try_get("role")
            .map_err(|e| StorageError::QueryFailed(format!("role column: {e}")))?;
        let role = match role_str.as_str() {
            "user" => MessageRole::User,
            "assistant" => MessageRole::Assistant,
            "system" => MessageRole::System,
            other => {
                return Err(StorageError::QueryFailed(format!("unknown role '{other}'")));
            }
        };

        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| StorageError::QueryFailed(format!("created_at column: {e}")))?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let error_code: Option<String> = row.try_get("error_code").unwrap_or(None);
        let error_message: Option<String> = row.try_get("error_message").unwrap_or(None);
        let error = error_code.map(|code| MessageError {
            code,
            message: error_message.unwrap_or_default(),
        });

        Ok(Message {
            id: row
                .try_get("id")
                .map_err(|e| StorageError::QueryFailed(format!("id column: {e}")))?,
            session_id: row
                .try_get("session_id")
                .map_err(|e| StorageError::QueryFailed(format!("session_id column: {e}")))?,
            topic_id: row.try_get("topic_id").unwrap_or(None),
            parent_id: row.try_get("parent_id").unwrap_or(None),
            role,
            content: row.try_get("content").unwrap_or_default(),
            from_model: row.try_get("from_model").unwrap_or(None),
            from_provider: row.try_get("from_provider").unwrap_or(None),
            error,
            created_at,
        })
    }

    fn role_to_str(role: MessageRole) -> &'static str {
        match role {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn list(&self) -> Result<Vec<Session>, StorageError> {
        let rows = sqlx::query("SELECT * FROM sessions ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::QueryFailed(format!("list sessions: {e}")))?;
        rows.iter().map(Self::row_to_session).collect()
    }

    async fn get(&self, id: &str) -> Result<Option<Session>, StorageError> {
        let row = sqlx::query("SELECT * FROM sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::QueryFailed(format!("get session: {e}")))?;
        row.as_ref().map(Self::row_to_session).transpose()
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

        sqlx::query(
            r#"
            INSERT INTO sessions (id, title, description, system_role, model, provider, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.title)
        .bind(&stored.description)
        .bind(&stored.system_role)
        .bind(&stored.model)
        .bind(&stored.provider)
        .bind(stored.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Storage(format!("insert session: {e}")))?;

        Ok(stored)
    }
}

#[async_trait]
impl MessageStore for SqliteStore {
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

        sqlx::query(
            r#"
            INSERT INTO messages
                (id, session_id, topic_id, parent_id, role, content,
                 from_model, from_provider, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.session_id)
        .bind(&stored.topic_id)
        .bind(&stored.parent_id)
        .bind(Self::role_to_str(stored.role))
        .bind(&stored.content)
        .bind(&stored.from_model)
        .bind(&stored.from_provider)
        .bind(stored.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Storage(format!("insert message: {e}")))?;

        Ok(stored)
    }

    async fn update_content(&self, id: &str, content: &str) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE messages SET content = ? WHERE id = ?")
            .bind(content)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Storage(format!("update message: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("message {id}")));
        }
        Ok(())
    }

    async fn mark_failed(&self, id: &str, error: MessageError) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE messages SET error_code = ?, error_message = ? WHERE id = ?",
        )
        .bind(&error.code)
        .bind(&error.message)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Storage(format!("mark failed: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("message {id}")));
        }
        Ok(())
    }

    async fn list_for_session(
        &self,
        session_id: &str,
        topic_id: Option<&str>,
    ) -> Result<Vec<Message>, StorageError> {
        let rows = match topic_id {
            Some(topic) => {
                sqlx::query(
                    "SELECT * FROM messages WHERE session_id = ? AND topic_id = ? \
                     ORDER BY created_at ASC",
                )
                .bind(session_id)
                .bind(topic)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT * FROM messages WHERE session_id = ? AND topic_id IS NULL \
                     ORDER BY created_at ASC",
                )
                .bind(session_id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| StorageError::QueryFailed(format!("list messages: {e}")))?;

        rows.iter().map(Self::row_to_message).collect()
    }

    async fn get(&self, id: &str) -> Result<Option<Message>, StorageError> {
        let row = sqlx::query("SELECT * FROM messages WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::QueryFailed(format!("get message: {e}")))?;
        row.as_ref().map(Self::row_to_message).transpose()
    }
}
