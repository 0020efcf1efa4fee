pub mod chat;
pub mod roles;
pub mod sessions;

use rolechat_config::AppConfig;
use rolechat_core::message::MessageStore;
use rolechat_core::session::SessionStore;
use rolechat_storage::in_memory::InMemoryStore;
use rolechat_storage::sqlite::SqliteStore;
use std::sync::Arc;

/// Open the configured storage backend as trait-object handles.
pub(crate) async fn open_stores(
    config: &AppConfig,
) -> Result<(Arc<dyn SessionStore>, Arc<dyn MessageStore>), Box<dyn std::error::Error>> {
    match config.storage.backend.as_str() {
        "memory" => {
            let store = Arc::new(InMemoryStore::new());
            Ok((store.clone() as Arc<dyn SessionStore>, store as Arc<dyn MessageStore>))
        }
        _ => {
            if let Some(parent) = config.storage.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let store =
                Arc::new(SqliteStore::new(&config.storage.path.to_string_lossy()).await?);
            Ok((store.clone() as Arc<dyn SessionStore>, store as Arc<dyn MessageStore>))
        }
    }
}
