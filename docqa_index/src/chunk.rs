//! Character-based page chunking with overlap.

use docqa_core::ConfigurationError;
use text_splitter::{ChunkConfig, TextSplitter};

/// Splits page text into chunks of at most `chunk_size` characters, with
/// up to `chunk_overlap` characters shared between neighbours. Breaks fall
/// on the largest semantic boundary that fits (paragraph, line, sentence,
/// word) and chunks are trimmed.
pub struct TextChunker {
    splitter: TextSplitter<text_splitter::Characters>,
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ConfigurationError> {
        if chunk_size == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "chunk_size",
                reason: "must be at least 1".to_string(),
            });
        }
        let config = ChunkConfig::new(chunk_size)
            .with_overlap(chunk_overlap)
            .map_err(|e| ConfigurationError::InvalidValue {
                field: "chunk_overlap",
                reason: format!("must be smaller than chunk_size ({chunk_size}): {e}"),
            })?;

        Ok(Self {
            splitter: TextSplitter::new(config),
        })
    }

    #[must_use]
    pub fn split(&self, text: &str) -> Vec<String> {
        self.splitter
            .chunks(text)
            .filter(|chunk| !chunk.trim().is_empty())
            .map(str::to_string)
            .collect()
    }
}
