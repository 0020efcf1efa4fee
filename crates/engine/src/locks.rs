//! Per-session turn serialization.
//!
//! At most one generation runs per session at a time. Callers acquire the
//! session's lock before touching the message ledger and hold it until the
//! turn reaches a terminal event, so concurrent turns against the same
//! session queue up instead of interleaving placeholder writes.

use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A keyed set of async mutexes, one per session.
#[derive(Default)]
pub struct SessionLocks {
    inner: Mutex<HashMap<String, std::sync::Arc<AsyncMutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `key`, waiting if another turn holds it.
    ///
    /// The guard is owned, so it can move into the task that runs the turn
    /// and release on drop.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let entry = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            map.entry(key.to_string()).or_default().clone()
        };
        entry.lock_owned().await
    }
}
