#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod error;
pub mod index;
pub mod memory;
pub mod snippet;

pub use error::{ConfigurationError, GenerationError, RetrievalError, TemplateError, TurnError};
pub use index::{IndexReport, UrlOutcome};
pub use memory::{HISTORY_KEY, INPUT_KEY, MemorySource, SNIPPETS_KEY};
pub use snippet::{DisplaySnippet, RenderedSnippet, Snippet, strip_markers};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One user or assistant message in a conversation log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Generation {
    pub content: String,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Text generation service: one prompt in, one completion out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Generation, GenerationError>;
}

/// Embedding service used by the indexer and the in-memory retriever.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// Semantic snippet lookup over an already built index.
#[async_trait]
pub trait SnippetRetriever: Send + Sync {
    /// Returns at most `top_k` snippets, best match first.
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Snippet>, RetrievalError>;
}

/// Builds a queryable index from document URLs.
///
/// Indexing is best-effort: a URL that cannot be processed is recorded in
/// the returned [`IndexReport`] and left out of the index. An error is only
/// returned when nothing could be indexed at all.
#[async_trait]
pub trait DocumentIndexer: Send + Sync {
    type Index: SnippetRetriever;

    async fn index(&self, urls: &[String]) -> Result<(Self::Index, IndexReport), RetrievalError>;
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for std::sync::Arc<T> {
    async fn generate(&self, prompt: &str) -> Result<Generation, GenerationError> {
        (**self).generate(prompt).await
    }
}

#[async_trait]
impl<T: Embedder + ?Sized> Embedder for std::sync::Arc<T> {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        (**self).embed(text).await
    }
}

#[async_trait]
impl<T: SnippetRetriever + ?Sized> SnippetRetriever for std::sync::Arc<T> {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Snippet>, RetrievalError> {
        (**self).retrieve(query, top_k).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_serializes_with_lowercase_role() {
        let Ok(json) = serde_json::to_value(Turn::user("hi")) else {
            panic!("turn should serialize");
        };
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hi");
    }
}
