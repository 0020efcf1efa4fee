//! File-backed role directory.
//!
//! Roles live in a flat, versioned JSON array (`roles.json`), each record
//! carrying a numeric-or-string id, a unique name, a description, and a
//! free-form personality payload. The directory is read on every lookup so
//! external edits are picked up without a restart.

use async_trait::async_trait;
use rolechat_core::error::StorageError;
use rolechat_core::role::{RoleDirectory, RoleRecord};
use std::path::PathBuf;
use tracing::debug;

/// Read-only role directory over a flat `roles.json` file.
pub struct FileRoleDirectory {
    path: PathBuf,
}

impl FileRoleDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_all(&self) -> Result<Vec<RoleRecord>, StorageError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            StorageError::Storage(format!("read {}: {e}", self.path.display()))
        })?;
        let roles: Vec<RoleRecord> = serde_json::from_str(&raw)
            .map_err(|e| StorageError::Storage(format!("parse {}: {e}", self.path.display())))?;
        debug!(count = roles.len(), "Loaded role directory");
        Ok(roles)
    }
}

#[async_trait]
impl RoleDirectory for FileRoleDirectory {
    async fn find_by_name(&self, name: &str) -> Result<Option<RoleRecord>, StorageError> {
        let roles = self.read_all().await?;
        Ok(roles.into_iter().find(|r| r.name == name))
    }

    async fn list(&self) -> Result<Vec<RoleRecord>, StorageError> {
        self.read_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLES_JSON: &str = r#"[
        {"role_id": 1, "name": "张三", "description": "A friendly AI assistant",
         "personality": {"tone": "warm"}},
        {"role_id": "r-2", "name": "李四", "description": "A strict teacher"}
    ]"#;

    fn write_roles(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("roles.json");
        std::fs::write(&path, ROLES_JSON).unwrap();
        path
    }

    #[tokio::test]
    async fn finds_role_by_exact_name() {
        let dir = tempfile::tempdir().unwrap();
        let directory = FileRoleDirectory::new(write_roles(&dir));

        let role = directory.find_by_name("张三").await.unwrap().unwrap();
        assert_eq!(role.description.as_deref(), Some("A friendly AI assistant"));
    }

    #[tokio::test]
    async fn lookup_is_exact_not_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let directory = FileRoleDirectory::new(write_roles(&dir));

        assert!(directory.find_by_name("张三 ").await.unwrap().is_none());
        assert!(directory.find_by_name("王五").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lists_all_roles() {
        let dir = tempfile::tempdir().unwrap();
        let directory = FileRoleDirectory::new(write_roles(&dir));

        let roles = directory.list().await.unwrap();
        assert_eq!(roles.len(), 2);
    }

    #[tokio::test]
    async fn missing_file_is_storage_error() {
        let directory = FileRoleDirectory::new("/nonexistent/roles.json");
        assert!(matches!(
            directory.find_by_name("张三").await,
            Err(StorageError::Storage(_))
        ));
    }
}
