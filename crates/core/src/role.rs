//! Role domain types and the role directory trait.
//!
//! A role is a named persona with a fixed description and an opaque
//! personality payload. Roles are owned by an external directory; the engine
//! only ever reads them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// A role identifier as stored in the directory — either numeric or textual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleId {
    Number(u64),
    Text(String),
}

/// A single role record from the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleRecord {
    /// Directory-assigned identifier.
    pub role_id: RoleId,

    /// Unique role name; lookup is exact, session matching is trim-compared.
    pub name: String,

    /// Persona description, used as the session's system role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Free-form personality payload; serialized verbatim into the prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<serde_json::Value>,
}

impl RoleRecord {
    /// Build the system prompt for this role: description followed by the
    /// serialized personality, newline-joined. Missing parts are skipped.
    pub fn system_prompt(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(description) = &self.description {
            if !description.is_empty() {
                parts.push(description.clone());
            }
        }
        if let Some(personality) = &self.personality {
            parts.push(personality.to_string());
        }
        parts.join("\n")
    }
}

/// Read-only lookup into the role directory.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// Find a role by exact name. `Ok(None)` means the role does not exist.
    async fn find_by_name(&self, name: &str)
        -> std::result::Result<Option<RoleRecord>, StorageError>;

    /// List every role in the directory.
    async fn list(&self) -> std::result::Result<Vec<RoleRecord>, StorageError>;
}
