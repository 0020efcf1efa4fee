//! Storage backends for rolechat.
//!
//! All backends implement the `rolechat_core` store traits:
//! - `InMemoryStore` — sessions and messages in a Vec, for tests and
//!   ephemeral runs
//! - `SqliteStore` — durable sessions and messages via sqlx (WAL)
//! - `FileRoleDirectory` — read-only role lookup over a flat `roles.json`

pub mod in_memory;
pub mod roles;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemoryStore;
pub use roles::FileRoleDirectory;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
