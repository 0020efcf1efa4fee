//! Role knowledge retrieval for rolechat.
//!
//! Three pieces, composed by the engine:
//! - `RoleKnowledgeLibrary` — loads a role's style block and raw knowledge
//!   items from the file-backed knowledge root
//! - `SimilarityRanker` — scores candidates against a query via one batched
//!   embedding call
//! - `ContextBuilder` — renders the style and ranked-knowledge sections into
//!   a single prompt-insertable block

pub mod context;
pub mod library;
pub mod ranker;

pub use context::ContextBuilder;
pub use library::RoleKnowledgeLibrary;
pub use ranker::SimilarityRanker;
