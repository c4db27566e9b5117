//! Prompt-facing views over the two windows.

use docqa_core::{HISTORY_KEY, MemorySource, SNIPPETS_KEY, Turn};

use crate::{MessageWindow, SnippetWindow};

/// Recent conversation turns, filling `{history}`.
#[derive(Debug, Clone, Copy)]
pub struct HistoryMemory<'a> {
    window: &'a MessageWindow,
    turns: &'a [Turn],
}

impl<'a> HistoryMemory<'a> {
    #[must_use]
    pub const fn new(window: &'a MessageWindow, turns: &'a [Turn]) -> Self {
        Self { window, turns }
    }
}

impl MemorySource for HistoryMemory<'_> {
    fn memory_key(&self) -> &'static str {
        HISTORY_KEY
    }

    fn load(&self) -> String {
        self.window.render_history(self.turns)
    }
}

/// Retained document snippets, filling `{snippets}`.
#[derive(Debug, Clone, Copy)]
pub struct SnippetMemory<'a> {
    window: &'a SnippetWindow,
}

impl<'a> SnippetMemory<'a> {
    #[must_use]
    pub const fn new(window: &'a SnippetWindow) -> Self {
        Self { window }
    }
}

impl MemorySource for SnippetMemory<'_> {
    fn memory_key(&self) -> &'static str {
        SNIPPETS_KEY
    }

    fn load(&self) -> String {
        self.window.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_core::Snippet;

    #[test]
    fn sources_report_their_keys_and_text() {
        let message_window = MessageWindow::default();
        let turns = vec![Turn::user("hi"), Turn::assistant("hello")];
        let history = HistoryMemory::new(&message_window, &turns);
        assert_eq!(history.memory_key(), "history");
        assert_eq!(history.load(), "Human: hi\nAI: hello");

        let mut snippet_window = SnippetWindow::new(2);
        snippet_window.merge(&[Snippet::new("s", "s", 0, "body")]);
        let snippets = SnippetMemory::new(&snippet_window);
        assert_eq!(snippets.memory_key(), "snippets");
        assert_eq!(snippets.load(), snippet_window.render());
    }
}
