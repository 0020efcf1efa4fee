//! Session resolution for role-bound conversations.
//!
//! One role maps to one reusable session by convention: the session title
//! equals the role name, trim-compared. An explicit session id always wins
//! and is passed through untouched.

use rolechat_core::error::Result;
use rolechat_core::role::RoleRecord;
use rolechat_core::session::{NewSession, SessionStore};
use std::sync::Arc;
use tracing::debug;

pub struct SessionResolver {
    sessions: Arc<dyn SessionStore>,
}

impl SessionResolver {
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self { sessions }
    }

    /// Resolve the session id for a turn with `role`.
    ///
    /// Precedence: explicit `session_id` → existing session whose title
    /// trim-matches the role name (unless `create_new` forces a fresh one)
    /// → newly created session seeded from the role.
    pub async fn resolve(
        &self,
        role: &RoleRecord,
        session_id: Option<&str>,
        create_new: bool,
        model: &str,
        provider: &str,
    ) -> Result<String> {
        if let Some(id) = session_id {
            return Ok(id.to_string());
        }

        let sessions = self.sessions.list().await?;
        let existing = sessions
            .iter()
            .find(|s| s.title.trim() == role.name.trim());
        if let Some(session) = existing {
            if !create_new {
                debug!(session_id = %session.id, role = %role.name, "Reusing session");
                return Ok(session.id.clone());
            }
        }

        let description = role.description.clone().unwrap_or_default();
        let created = self
            .sessions
            .create(NewSession {
                title: role.name.clone(),
                description: description.clone(),
                system_role: description,
                model: model.to_string(),
                provider: provider.to_string(),
            })
            .await?;
        debug!(session_id = %created.id, role = %role.name, "Created session");
        Ok(created.id)
    }
}
