//! ChatProvider trait — the abstraction over LLM backends.
//!
//! A provider knows how to send a message list to a model and hand back the
//! raw response byte stream, and how to produce embedding vectors in a
//! single batched call. Decoding the byte stream into text deltas is the
//! orchestrator's job, not the provider's — the engine treats the backend
//! as a black box that yields bytes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::ChatMessage;

/// Configuration for a streaming chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The model to use (e.g. "gpt-4o-mini").
    pub model: String,

    /// The full prompt: system message, history, current user message.
    pub messages: Vec<ChatMessage>,

    /// Temperature (0.0 = deterministic, 1.0 = creative).
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Caller identity forwarded to the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

fn default_temperature() -> f32 {
    0.7
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: default_temperature(),
            max_tokens: None,
            user: None,
        }
    }
}

/// Token usage information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// An embedding request — one batched call for all inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// The embedding model (e.g. "text-embedding-3-small").
    pub model: String,

    /// The texts to embed, query first.
    pub inputs: Vec<String>,

    /// Fixed output dimensionality.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<u32>,
}

/// An embedding response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// The embedding vectors, one per input text, input order preserved.
    pub embeddings: Vec<Vec<f32>>,

    /// Which model was used.
    pub model: String,

    /// Token usage.
    pub usage: Option<Usage>,
}

/// The core ChatProvider trait.
///
/// The orchestrator calls `stream_chat()` and `embed()` without knowing
/// which backend is in use.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// A human-readable name for this provider (e.g. "openai").
    fn name(&self) -> &str;

    /// Start a streaming chat invocation and return the raw byte stream.
    ///
    /// Each received item is one transport chunk exactly as the backend
    /// produced it. The channel closing without an error is end-of-stream.
    async fn stream_chat(
        &self,
        request: ChatRequest,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<Vec<u8>, ProviderError>>,
        ProviderError,
    >;

    /// Generate embeddings for the given texts in one batched call.
    ///
    /// Default implementation reports embeddings as unsupported.
    async fn embed(
        &self,
        _request: EmbeddingRequest,
    ) -> std::result::Result<EmbeddingResponse, ProviderError> {
        Err(ProviderError::NotConfigured(format!(
            "Provider '{}' does not support embeddings",
            self.name()
        )))
    }
}
