//! LLM provider implementations for rolechat.
//!
//! All providers implement the `rolechat_core::ChatProvider` trait. The
//! engine consumes the raw byte stream and owns all decoding.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
