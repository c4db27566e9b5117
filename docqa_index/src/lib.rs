#![warn(
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
    clippy::missing_errors_doc,
    clippy::cast_precision_loss
)]

//! Best-effort indexing of PDF documents behind URLs.
//!
//! Each URL is downloaded, split into pages by an external extractor,
//! chunked, and embedded. URLs that fail at any step are reported and left
//! out; the rest form an in-memory index searched by cosine similarity.

mod chunk;
mod extract;
mod fetch;
mod indexer;
mod store;

pub use chunk::TextChunker;
pub use extract::{ExtractedDocument, PageExtractor, PopplerExtractor};
pub use fetch::{DocumentFetcher, FetchConfig, HttpFetcher};
pub use indexer::{IndexingConfig, PdfIndexer};
pub use store::{InMemoryIndex, IndexedChunk, cosine_similarity};
