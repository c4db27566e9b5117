use std::sync::Arc;

use async_trait::async_trait;
use docqa_core::{
    ConfigurationError, DocumentIndexer, Embedder, IndexReport, RetrievalError, Snippet,
};
use tracing::{debug, info, warn};

use crate::chunk::TextChunker;
use crate::extract::{PageExtractor, PopplerExtractor};
use crate::fetch::{DocumentFetcher, FetchConfig, HttpFetcher};
use crate::store::{InMemoryIndex, IndexedChunk};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
        }
    }
}

/// Downloads, extracts, chunks and embeds PDFs into an [`InMemoryIndex`].
pub struct PdfIndexer<E = Arc<dyn Embedder>, F = HttpFetcher, X = PopplerExtractor> {
    embedder: E,
    fetcher: F,
    extractor: X,
    chunker: TextChunker,
}

impl<E: Embedder + Clone> PdfIndexer<E> {
    /// Indexer that downloads over HTTP and extracts with poppler.
    pub fn new(embedder: E, config: IndexingConfig, fetch: FetchConfig) -> anyhow::Result<Self> {
        let fetcher = HttpFetcher::new(fetch)?;
        Ok(Self::with_components(
            embedder,
            fetcher,
            PopplerExtractor::default(),
            config,
        )?)
    }
}

impl<E, F, X> PdfIndexer<E, F, X>
where
    E: Embedder + Clone,
    F: DocumentFetcher,
    X: PageExtractor,
{
    pub fn with_components(
        embedder: E,
        fetcher: F,
        extractor: X,
        config: IndexingConfig,
    ) -> Result<Self, ConfigurationError> {
        let chunker = TextChunker::new(config.chunk_size, config.chunk_overlap)?;
        Ok(Self {
            embedder,
            fetcher,
            extractor,
            chunker,
        })
    }

    async fn index_url(&self, url: &str) -> Result<Vec<IndexedChunk>, RetrievalError> {
        let bytes = self.fetcher.fetch(url).await?;
        let document = self.extractor.extract(url, &bytes).await?;
        let title = document.title.unwrap_or_else(|| url.to_string());

        let mut chunks = Vec::new();
        for (page_index, page_text) in document.pages.iter().enumerate() {
            let page = u32::try_from(page_index).unwrap_or(u32::MAX);
            for content in self.chunker.split(page_text) {
                let embedding =
                    self.embedder
                        .embed(&content)
                        .await
                        .map_err(|e| RetrievalError::Embedding {
                            url: url.to_string(),
                            reason: e.to_string(),
                        })?;
                chunks.push(IndexedChunk {
                    snippet: Snippet::new(url, title.as_str(), page, content),
                    embedding,
                });
            }
        }

        if chunks.is_empty() {
            return Err(RetrievalError::Extraction {
                url: url.to_string(),
                reason: "document contains no extractable text".to_string(),
            });
        }

        debug!(
            "Indexed {url}: {} pages, {} chunks",
            document.pages.len(),
            chunks.len()
        );
        Ok(chunks)
    }
}

#[async_trait]
impl<E, F, X> DocumentIndexer for PdfIndexer<E, F, X>
where
    E: Embedder + Clone,
    F: DocumentFetcher,
    X: PageExtractor,
{
    type Index = InMemoryIndex<E>;

    async fn index(&self, urls: &[String]) -> Result<(Self::Index, IndexReport), RetrievalError> {
        let mut report = IndexReport::default();
        let mut all_chunks = Vec::new();

        for url in urls {
            match self.index_url(url).await {
                Ok(chunks) => {
                    info!("Indexed {url} ({} chunks)", chunks.len());
                    report.push(url.as_str(), Ok(chunks.len()));
                    all_chunks.extend(chunks);
                }
                Err(e) => {
                    warn!("Skipping {url}: {e}");
                    report.push(url.as_str(), Err(e));
                }
            }
        }

        if all_chunks.is_empty() {
            return Err(RetrievalError::NoDocuments);
        }

        info!(
            "Index ready: {} chunks from {}/{} documents",
            all_chunks.len(),
            report.succeeded().len(),
            urls.len()
        );
        Ok((InMemoryIndex::new(self.embedder.clone(), all_chunks), report))
    }
}
