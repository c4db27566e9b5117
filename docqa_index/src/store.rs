use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use docqa_core::{Embedder, RetrievalError, Snippet, SnippetRetriever};
use tracing::debug;

/// Compute cosine similarity between two embedding vectors.
///
/// Returns 0.0 for mismatched lengths or a zero-magnitude vector.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut mag_a = 0.0_f64;
    let mut mag_b = 0.0_f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = f64::from(*x);
        let y = f64::from(*y);
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }

    let denom = mag_a.sqrt() * mag_b.sqrt();
    if denom < f64::EPSILON {
        return 0.0;
    }

    dot / denom
}

#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub snippet: Snippet,
    pub embedding: Vec<f32>,
}

/// Brute-force vector index held in memory.
///
/// The query is embedded with the same [`Embedder`] that embedded the
/// chunks, then every chunk is scored.
pub struct InMemoryIndex<E = Arc<dyn Embedder>> {
    embedder: E,
    chunks: Vec<IndexedChunk>,
}

impl<E: Embedder> InMemoryIndex<E> {
    pub const fn new(embedder: E, chunks: Vec<IndexedChunk>) -> Self {
        Self { embedder, chunks }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[must_use]
    pub fn chunks(&self) -> &[IndexedChunk] {
        &self.chunks
    }

    fn rank(&self, query_embedding: &[f32], top_k: usize) -> Vec<Snippet> {
        let mut scored: Vec<(f64, &IndexedChunk)> = self
            .chunks
            .iter()
            .map(|chunk| (cosine_similarity(query_embedding, &chunk.embedding), chunk))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        scored
            .into_iter()
            .take(top_k)
            .map(|(_, chunk)| chunk.snippet.clone())
            .collect()
    }
}

#[async_trait]
impl<E: Embedder> SnippetRetriever for InMemoryIndex<E> {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Snippet>, RetrievalError> {
        let query_embedding =
            self.embedder
                .embed(query)
                .await
                .map_err(|source| RetrievalError::Query {
                    query: query.to_string(),
                    source,
                })?;

        let snippets = self.rank(&query_embedding, top_k);
        debug!(
            "Retrieved {} of {} chunks for query ({} chars)",
            snippets.len(),
            self.chunks.len(),
            query.len()
        );
        Ok(snippets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AxisEmbedder;

    #[async_trait]
    impl Embedder for AxisEmbedder {
        async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            match text {
                "x" => Ok(vec![1.0, 0.0]),
                "y" => Ok(vec![0.0, 1.0]),
                "diag" => Ok(vec![1.0, 1.0]),
                _ => anyhow::bail!("no embedding for {text}"),
            }
        }
    }

    fn chunk(content: &str, embedding: Vec<f32>) -> IndexedChunk {
        IndexedChunk {
            snippet: Snippet::new("https://x.io/a.pdf", "A", 0, content),
            embedding,
        }
    }

    fn index() -> InMemoryIndex<AxisEmbedder> {
        InMemoryIndex::new(
            AxisEmbedder,
            vec![
                chunk("along y", vec![0.0, 2.0]),
                chunk("along x", vec![3.0, 0.0]),
                chunk("mostly x", vec![2.0, 1.0]),
            ],
        )
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[5.0, 0.0]) - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_similarity_degenerate_inputs() {
        assert!(cosine_similarity(&[], &[]).abs() < f64::EPSILON);
        assert!(cosine_similarity(&[1.0], &[1.0, 2.0]).abs() < f64::EPSILON);
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn retrieves_best_matches_first() {
        let Ok(snippets) = index().retrieve("x", 2).await else {
            panic!("retrieval should succeed");
        };
        let contents: Vec<&str> = snippets.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(contents, vec!["along x", "mostly x"]);
    }

    #[tokio::test]
    async fn top_k_larger_than_index_returns_everything() {
        let Ok(snippets) = index().retrieve("y", 10).await else {
            panic!("retrieval should succeed");
        };
        assert_eq!(snippets.len(), 3);
        assert_eq!(snippets[0].content, "along y");
    }

    #[tokio::test]
    async fn embedding_failure_is_a_query_error() {
        let result = index().retrieve("unknown", 2).await;
        assert!(matches!(result, Err(RetrievalError::Query { .. })));
    }
}
