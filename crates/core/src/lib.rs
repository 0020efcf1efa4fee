//! # rolechat Core
//!
//! Domain types, traits, and error definitions for the rolechat orchestration
//! engine. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (role directory, session/message stores, model
//! provider) is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod event;
pub mod knowledge;
pub mod message;
pub mod provider;
pub mod role;
pub mod session;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, StorageError};
pub use event::ChatEvent;
pub use knowledge::{KnowledgeItem, StyleBlock, StyleExample};
pub use message::{
    ChatMessage, Message, MessageError, MessageRole, MessageStore, NewMessage, LOADING_SENTINEL,
};
pub use provider::{ChatProvider, ChatRequest, EmbeddingRequest, EmbeddingResponse, Usage};
pub use role::{RoleDirectory, RoleId, RoleRecord};
pub use session::{NewSession, Session, SessionStore};
