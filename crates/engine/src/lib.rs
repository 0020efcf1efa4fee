//! The role chat orchestration engine.
//!
//! `RoleChatEngine` is the composition root: it resolves a durable session
//! for a named role, persists the user message and an assistant placeholder,
//! then drives one streaming model invocation with bounded retry while
//! emitting a `meta → delta* → done-or-error` event sequence to the caller.
//!
//! Collaborators are injected as trait objects so the engine runs unchanged
//! against SQLite, in-memory stores, or test fakes.

pub mod decode;
pub mod ledger;
pub mod locks;
pub mod orchestrator;
pub mod resolver;

pub use ledger::MessageLedger;
pub use locks::SessionLocks;
pub use orchestrator::{ChatStream, ChatTurnRequest, RoleChatEngine};
pub use resolver::SessionResolver;
