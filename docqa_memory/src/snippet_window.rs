//! Deduplicating window over retrieved snippets.

use docqa_core::{DisplaySnippet, RenderedSnippet, Snippet};
use tracing::debug;

pub const DEFAULT_SNIPPET_WINDOW_SIZE: usize = 4;

/// The most recently merged unique snippets, most recent first.
///
/// Invariants: `len() <= capacity()` and no two entries share rendered
/// text. A snippet that is already present is neither re-added nor moved
/// to the front when it is retrieved again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetWindow {
    capacity: usize,
    entries: Vec<RenderedSnippet>,
}

impl SnippetWindow {
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::new(),
        }
    }

    /// Merge a batch of retrieved candidates, in retrieval order.
    ///
    /// Returns how many candidates were new to the window (before eviction).
    pub fn merge(&mut self, candidates: &[Snippet]) -> usize {
        // Work in insertion order: oldest entry first.
        self.entries.reverse();

        let mut added = 0;
        for candidate in candidates {
            let rendered = candidate.render();
            if !self.entries.iter().any(|e| e.text == rendered.text) {
                self.entries.push(rendered);
                added += 1;
            }
        }

        self.entries.reverse();
        let before = self.entries.len();
        self.entries.truncate(self.capacity);

        debug!(
            "Merged {} candidates: {added} new, {} evicted, {} kept",
            candidates.len(),
            before - self.entries.len(),
            self.entries.len()
        );

        added
    }

    /// Concatenated rendered blocks, most recent first.
    #[must_use]
    pub fn render(&self) -> String {
        self.entries.iter().map(|e| e.text.as_str()).collect()
    }

    #[must_use]
    pub fn display(&self) -> Vec<DisplaySnippet> {
        self.entries.iter().map(RenderedSnippet::to_display).collect()
    }

    #[must_use]
    pub fn entries(&self) -> &[RenderedSnippet] {
        &self.entries
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for SnippetWindow {
    fn default() -> Self {
        Self::new(DEFAULT_SNIPPET_WINDOW_SIZE)
    }
}
