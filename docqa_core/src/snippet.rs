//! Retrieved document snippets and their marked prompt rendering.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static START_MARKER: OnceLock<Regex> = OnceLock::new();
static END_MARKER: OnceLock<Regex> = OnceLock::new();

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn start_marker() -> &'static Regex {
    START_MARKER.get_or_init(|| {
        Regex::new(r"<START_SNIPPET_PAGE_\d+>")
            .expect("Static regex pattern is guaranteed to be valid")
    })
}

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn end_marker() -> &'static Regex {
    END_MARKER.get_or_init(|| {
        Regex::new(r"<END_SNIPPET_PAGE_\d+>")
            .expect("Static regex pattern is guaranteed to be valid")
    })
}

/// A text excerpt retrieved from an indexed document.
///
/// `page` is 0-indexed; rendering shows it 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub source_id: String,
    pub title: String,
    pub page: u32,
    pub content: String,
}

impl Snippet {
    #[must_use]
    pub fn new(
        source_id: impl Into<String>,
        title: impl Into<String>,
        page: u32,
        content: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            title: title.into(),
            page,
            content: content.into(),
        }
    }

    /// Format the snippet as a marked block for the prompt.
    #[must_use]
    pub fn render(&self) -> RenderedSnippet {
        let shown_page = u64::from(self.page) + 1;
        let document = if self.title == self.source_id {
            self.source_id.clone()
        } else {
            format!("[{}]({})", self.title, self.source_id)
        };
        let text = format!(
            "The following snippet was extracted from the following document: {document}\n\
             <START_SNIPPET_PAGE_{shown_page}>\n{}\n<END_SNIPPET_PAGE_{shown_page}>\n",
            self.content
        );

        RenderedSnippet {
            page: self.page,
            text,
            content: self.content.clone(),
        }
    }
}

/// A snippet after rendering. Two rendered snippets are the same snippet
/// exactly when their text is equal.
#[derive(Debug, Clone)]
pub struct RenderedSnippet {
    pub page: u32,
    pub text: String,
    content: String,
}

impl PartialEq for RenderedSnippet {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for RenderedSnippet {}

impl RenderedSnippet {
    /// The original snippet content between the page markers, unchanged
    /// even when it or the title contains marker-like text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn to_display(&self) -> DisplaySnippet {
        DisplaySnippet {
            page: self.page,
            content: strip_markers(&self.text),
        }
    }
}

/// What a host shows for a snippet currently in the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplaySnippet {
    /// 0-indexed page number.
    pub page: u32,
    /// Rendered block with the page markers removed.
    pub content: String,
}

impl DisplaySnippet {
    #[must_use]
    pub fn display_page(&self) -> u64 {
        u64::from(self.page) + 1
    }
}

/// Remove every `<START_SNIPPET_PAGE_n>` / `<END_SNIPPET_PAGE_n>` marker.
#[must_use]
pub fn strip_markers(text: &str) -> String {
    let text = start_marker().replace_all(text, "");
    end_marker().replace_all(&text, "").into_owned()
}
