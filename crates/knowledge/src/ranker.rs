//! Similarity ranking of knowledge candidates against a live query.
//!
//! One batched embedding call covers the query plus every candidate text;
//! candidates are scored by the raw dot product with the query vector (no
//! normalization — magnitude is part of the ranking signal). Ties keep
//! input order.

use rolechat_core::error::ProviderError;
use rolechat_core::knowledge::KnowledgeItem;
use rolechat_core::provider::{ChatProvider, EmbeddingRequest};
use std::sync::Arc;
use tracing::debug;

/// Dot product over the shared prefix of two vectors.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Ranks candidate snippets by embedding similarity to a query.
pub struct SimilarityRanker {
    provider: Arc<dyn ChatProvider>,
    model: String,
    dimensions: u32,
}

impl SimilarityRanker {
    pub fn new(provider: Arc<dyn ChatProvider>, model: impl Into<String>, dimensions: u32) -> Self {
        Self { provider, model: model.into(), dimensions }
    }

    /// Rank `candidates` against `query`, returning at most `top_k` items
    /// sorted by descending score.
    ///
    /// An empty candidate set, a zero `top_k`, or a missing query vector are
    /// normal "no knowledge available" outcomes, not failures.
    pub async fn rank(
        &self,
        candidates: Vec<KnowledgeItem>,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<KnowledgeItem>, ProviderError> {
        if candidates.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        // One call for query + all candidates — never N+1.
        let mut inputs = Vec::with_capacity(candidates.len() + 1);
        inputs.push(query.to_string());
        inputs.extend(candidates.iter().map(|c| c.text.clone()));

        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.model.clone(),
                inputs,
                dimensions: Some(self.dimensions),
            })
            .await?;

        let mut embeddings = response.embeddings.into_iter();
        let Some(query_embedding) = embeddings.next() else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<KnowledgeItem> = candidates
            .into_iter()
            .zip(embeddings)
            .map(|(mut item, embedding)| {
                item.score = dot(&query_embedding, &embedding);
                item
            })
            .collect();

        if scored.is_empty() {
            return Ok(Vec::new());
        }

        // Stable sort: ties keep input order.
        scored.sort_by(|a, b| {
            b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);

        debug!(count = scored.len(), "Ranked knowledge candidates");
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rolechat_core::provider::{ChatRequest, EmbeddingResponse};
    use tokio::sync::mpsc;

    /// Embeds each input as a preset vector, query first.
    struct FixedEmbedder {
        vectors: Vec<Vec<f32>>,
    }

    #[async_trait]
    impl ChatProvider for FixedEmbedder {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn stream_chat(
            &self,
            _request: ChatRequest,
        ) -> Result<mpsc::Receiver<Result<Vec<u8>, ProviderError>>, ProviderError> {
            Err(ProviderError::NotConfigured("embedding-only mock".into()))
        }

        async fn embed(
            &self,
            request: EmbeddingRequest,
        ) -> Result<EmbeddingResponse, ProviderError> {
            Ok(EmbeddingResponse {
                embeddings: self.vectors.iter().take(request.inputs.len()).cloned().collect(),
                model: request.model,
                usage: None,
            })
        }
    }

    fn item(id: &str, text: &str) -> KnowledgeItem {
        KnowledgeItem {
            id: id.into(),
            category: "faq".into(),
            text: text.into(),
            question: None,
            answer: None,
            score: 0.0,
        }
    }

    fn ranker(vectors: Vec<Vec<f32>>) -> SimilarityRanker {
        SimilarityRanker::new(Arc::new(FixedEmbedder { vectors }), "text-embedding-3-small", 1024)
    }

    #[test]
    fn dot_product_values() {
        assert_eq!(dot(&[1.0, 2.0], &[3.0, 4.0]), 11.0);
        assert_eq!(dot(&[], &[]), 0.0);
        // Shared-prefix semantics for mismatched lengths
        assert_eq!(dot(&[1.0, 2.0, 9.0], &[3.0, 4.0]), 11.0);
    }

    #[tokio::test]
    async fn empty_candidates_rank_empty() {
        let ranked = ranker(vec![]).rank(vec![], "query", 3).await.unwrap();
        assert!(ranked.is_empty());
    }

    #[tokio::test]
    async fn zero_top_k_ranks_empty() {
        let ranked = ranker(vec![vec![1.0], vec![1.0]])
            .rank(vec![item("a", "a text")], "query", 0)
            .await
            .unwrap();
        assert!(ranked.is_empty());
    }

    #[tokio::test]
    async fn missing_query_vector_ranks_empty() {
        let ranked = ranker(vec![])
            .rank(vec![item("a", "a text")], "query", 3)
            .await
            .unwrap();
        assert!(ranked.is_empty());
    }

    #[tokio::test]
    async fn ranks_by_descending_dot_product() {
        // query = [1, 0]; scores: a = 0.2, b = 0.9, c = 0.5
        let ranked = ranker(vec![
            vec![1.0, 0.0],
            vec![0.2, 1.0],
            vec![0.9, 1.0],
            vec![0.5, 1.0],
        ])
        .rank(
            vec![item("a", "a text"), item("b", "b text"), item("c", "c text")],
            "query",
            3,
        )
        .await
        .unwrap();

        let ids: Vec<&str> = ranked.iter().map(|it| it.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "a"]);
        assert!(ranked[0].score > ranked[1].score);
    }

    #[tokio::test]
    async fn truncates_to_top_k() {
        let ranked = ranker(vec![
            vec![1.0],
            vec![0.1],
            vec![0.3],
            vec![0.2],
        ])
        .rank(
            vec![item("a", "a"), item("b", "b"), item("c", "c")],
            "query",
            2,
        )
        .await
        .unwrap();

        assert_eq!(ranked.len(), 2);
        let ids: Vec<&str> = ranked.iter().map(|it| it.id.as_str()).collect();
        assert_eq!(ids, ["b", "c"]);
    }

    #[tokio::test]
    async fn ties_keep_input_order() {
        let ranked = ranker(vec![vec![1.0], vec![0.5], vec![0.5]])
            .rank(vec![item("first", "x"), item("second", "y")], "query", 2)
            .await
            .unwrap();

        assert_eq!(ranked[0].id, "first");
        assert_eq!(ranked[1].id, "second");
    }
}
