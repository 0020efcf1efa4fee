//! Role knowledge domain types.
//!
//! Knowledge items are derived per-request from a role's knowledge file and
//! never persisted; the `score` field is populated only after ranking.

use serde::{Deserialize, Serialize};

/// A role-specific fact or snippet eligible for semantic retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeItem {
    pub id: String,

    /// Which knowledge category this item came from.
    pub category: String,

    /// The ranking text: either the raw `text` field or the question/answer
    /// concatenation. Never empty after loading.
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,

    /// Similarity score against the live query; set by the ranker.
    #[serde(default)]
    pub score: f32,
}

/// A single positive or negative style example.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleExample {
    pub id: String,
    pub text: String,
}

/// Role-specific tone and phrasing guidance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleBlock {
    /// Verbatim style rules text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<String>,

    /// Illustrative utterances to imitate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<StyleExample>>,

    /// Forbidden phrasing patterns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avoid: Option<Vec<StyleExample>>,
}

impl StyleBlock {
    /// Whether any of the three sections carries content.
    pub fn has_content(&self) -> bool {
        self.rules.as_deref().is_some_and(|r| !r.trim().is_empty())
            || self.examples.as_deref().is_some_and(|e| !e.is_empty())
            || self.avoid.as_deref().is_some_and(|a| !a.is_empty())
    }
}
