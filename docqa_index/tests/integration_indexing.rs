//! Indexing and retrieval against mock fetch, extraction and embedding
//! services.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use docqa_core::{DocumentIndexer, Embedder, RetrievalError, SnippetRetriever};
use docqa_index::{
    DocumentFetcher, ExtractedDocument, IndexingConfig, PageExtractor, PdfIndexer,
};

/// Serves the URL itself as the document body, or fails for unknown URLs.
struct MapFetcher {
    known: Vec<&'static str>,
}

#[async_trait]
impl DocumentFetcher for MapFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, RetrievalError> {
        if self.known.contains(&url) {
            Ok(url.as_bytes().to_vec())
        } else {
            Err(RetrievalError::Download {
                url: url.to_string(),
                reason: "404 Not Found".to_string(),
            })
        }
    }
}

/// Returns canned pages keyed by the fetched body.
struct MapExtractor {
    documents: HashMap<&'static str, ExtractedDocument>,
}

#[async_trait]
impl PageExtractor for MapExtractor {
    async fn extract(&self, url: &str, bytes: &[u8]) -> Result<ExtractedDocument, RetrievalError> {
        let key = String::from_utf8_lossy(bytes);
        self.documents
            .get(&*key)
            .cloned()
            .ok_or_else(|| RetrievalError::Extraction {
                url: url.to_string(),
                reason: "not a PDF".to_string(),
            })
    }
}

/// Embeds by keyword: "cats" and "dogs" get orthogonal axes.
#[derive(Clone, Default)]
struct KeywordEmbedder {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text.contains("poison") {
            anyhow::bail!("embedding service rejected input");
        }
        let cats = if text.contains("cats") { 1.0 } else { 0.0 };
        let dogs = if text.contains("dogs") { 1.0 } else { 0.0 };
        Ok(vec![cats, dogs, 0.1])
    }
}

const PETS: &str = "https://example.com/pets.pdf";
const MISSING: &str = "https://example.com/missing.pdf";
const BROKEN: &str = "https://example.com/broken.pdf";
const POISON: &str = "https://example.com/poison.pdf";
const SCANNED: &str = "https://example.com/scanned.pdf";

fn indexer(
    embedder: KeywordEmbedder,
) -> PdfIndexer<KeywordEmbedder, MapFetcher, MapExtractor> {
    let mut documents = HashMap::new();
    documents.insert(
        PETS,
        ExtractedDocument {
            title: Some("Pet Care".to_string()),
            pages: vec![
                "All about cats and their habits.".to_string(),
                "All about dogs and their walks.".to_string(),
            ],
        },
    );
    documents.insert(
        POISON,
        ExtractedDocument {
            title: None,
            pages: vec!["poison page".to_string()],
        },
    );
    documents.insert(
        SCANNED,
        ExtractedDocument {
            title: None,
            pages: vec!["   ".to_string(), String::new()],
        },
    );

    let fetcher = MapFetcher {
        known: vec![PETS, BROKEN, POISON, SCANNED],
    };
    let extractor = MapExtractor { documents };

    let Ok(indexer) =
        PdfIndexer::with_components(embedder, fetcher, extractor, IndexingConfig::default())
    else {
        panic!("indexer should build");
    };
    indexer
}

fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

#[tokio::test]
async fn failed_url_is_reported_and_the_rest_is_indexed() {
    let Ok((index, report)) = indexer(KeywordEmbedder::default())
        .index(&urls(&[MISSING, PETS]))
        .await
    else {
        panic!("one good URL should be enough");
    };

    assert_eq!(index.len(), 2);
    assert_eq!(report.succeeded(), vec![PETS]);
    let failed = report.failed();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, MISSING);
    assert!(matches!(failed[0].1, RetrievalError::Download { .. }));
    assert_eq!(report.total_chunks(), 2);
}

#[tokio::test]
async fn every_kind_of_per_url_failure_is_isolated() {
    let Ok((index, report)) = indexer(KeywordEmbedder::default())
        .index(&urls(&[BROKEN, POISON, SCANNED, PETS]))
        .await
    else {
        panic!("pets document should index");
    };

    assert_eq!(index.len(), 2);
    let failed = report.failed();
    assert_eq!(failed.len(), 3);
    assert!(matches!(failed[0].1, RetrievalError::Extraction { .. }));
    assert!(matches!(failed[1].1, RetrievalError::Embedding { .. }));
    assert!(matches!(failed[2].1, RetrievalError::Extraction { .. }));
}

#[tokio::test]
async fn all_urls_failing_is_no_documents() {
    let result = indexer(KeywordEmbedder::default())
        .index(&urls(&[MISSING, BROKEN]))
        .await;
    assert!(matches!(result, Err(RetrievalError::NoDocuments)));
}

#[tokio::test]
async fn chunks_carry_source_title_and_page() {
    let Ok((index, _)) = indexer(KeywordEmbedder::default())
        .index(&urls(&[PETS]))
        .await
    else {
        panic!("indexing should succeed");
    };

    let pages: Vec<u32> = index.chunks().iter().map(|c| c.snippet.page).collect();
    assert_eq!(pages, vec![0, 1]);
    assert!(index.chunks().iter().all(|c| c.snippet.source_id == PETS));
    assert!(index.chunks().iter().all(|c| c.snippet.title == "Pet Care"));
}

#[tokio::test]
async fn missing_title_falls_back_to_url() {
    let mut documents = HashMap::new();
    documents.insert(
        PETS,
        ExtractedDocument {
            title: None,
            pages: vec!["cats".to_string()],
        },
    );
    let Ok(untitled) = PdfIndexer::with_components(
        KeywordEmbedder::default(),
        MapFetcher { known: vec![PETS] },
        MapExtractor { documents },
        IndexingConfig::default(),
    ) else {
        panic!("indexer should build");
    };
    let Ok((index, _)) = untitled.index(&urls(&[PETS])).await else {
        panic!("indexing should succeed");
    };
    assert_eq!(index.chunks()[0].snippet.title, PETS);

    let rendered = index.chunks()[0].snippet.render();
    assert!(rendered.text.contains(&format!("document: {PETS}\n")));
}

#[tokio::test]
async fn retrieval_ranks_by_similarity_and_embeds_the_query() {
    let embedder = KeywordEmbedder::default();
    let calls = embedder.calls.clone();
    let Ok((index, _)) = indexer(embedder).index(&urls(&[PETS])).await else {
        panic!("indexing should succeed");
    };
    let after_indexing = calls.load(Ordering::SeqCst);
    assert_eq!(after_indexing, 2);

    let Ok(snippets) = index.retrieve("tell me about dogs", 1).await else {
        panic!("retrieval should succeed");
    };
    assert_eq!(snippets.len(), 1);
    assert_eq!(snippets[0].page, 1);
    assert!(snippets[0].content.contains("dogs"));
    assert_eq!(calls.load(Ordering::SeqCst), after_indexing + 1);
}

#[tokio::test]
async fn query_embedding_failure_is_a_retrieval_error() {
    let Ok((index, _)) = indexer(KeywordEmbedder::default())
        .index(&urls(&[PETS]))
        .await
    else {
        panic!("indexing should succeed");
    };
    let result = index.retrieve("poison question", 2).await;
    assert!(matches!(result, Err(RetrievalError::Query { .. })));
}
