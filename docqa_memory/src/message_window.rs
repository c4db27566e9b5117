//! Sliding windows over the conversation turn log.
//!
//! The same log feeds two independent windows: the last few turns rendered
//! for conversational continuity, and the last few user inputs joined into
//! the retrieval query.

use docqa_core::{Role, Turn};

/// Configuration for the message windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageWindowConfig {
    /// Number of most recent turns rendered into the prompt history
    pub history_window_size: usize,
    /// Number of most recent user turns joined into the retrieval query
    pub retrieval_query_window_size: usize,
    /// Label for user turns in the rendered history
    pub human_prefix: String,
    /// Label for assistant turns in the rendered history
    pub ai_prefix: String,
}

impl Default for MessageWindowConfig {
    fn default() -> Self {
        Self {
            history_window_size: 6,
            retrieval_query_window_size: 4,
            human_prefix: "Human".to_string(),
            ai_prefix: "AI".to_string(),
        }
    }
}

impl MessageWindowConfig {
    #[must_use]
    pub const fn with_history_window_size(mut self, size: usize) -> Self {
        self.history_window_size = size;
        self
    }

    #[must_use]
    pub const fn with_retrieval_query_window_size(mut self, size: usize) -> Self {
        self.retrieval_query_window_size = size;
        self
    }
}

/// Selects which turns of the log reach the prompt and the retriever.
#[derive(Debug, Clone, Default)]
pub struct MessageWindow {
    config: MessageWindowConfig,
}

impl MessageWindow {
    #[must_use]
    pub const fn with_config(config: MessageWindowConfig) -> Self {
        Self { config }
    }

    /// The last `history_window_size` turns.
    #[must_use]
    pub fn history_turns<'a>(&self, turns: &'a [Turn]) -> &'a [Turn] {
        let start = turns.len().saturating_sub(self.config.history_window_size);
        &turns[start..]
    }

    /// Role-labeled history text, one turn per line.
    #[must_use]
    pub fn render_history(&self, turns: &[Turn]) -> String {
        self.history_turns(turns)
            .iter()
            .map(|turn| {
                let label = match turn.role {
                    Role::User => &self.config.human_prefix,
                    Role::Assistant => &self.config.ai_prefix,
                };
                format!("{label}: {}", turn.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Content of the last `retrieval_query_window_size` user turns, oldest
    /// first.
    #[must_use]
    pub fn recent_user_inputs<'a>(&self, turns: &'a [Turn]) -> Vec<&'a str> {
        let mut inputs: Vec<&str> = turns
            .iter()
            .rev()
            .filter(|t| t.role == Role::User)
            .take(self.config.retrieval_query_window_size)
            .map(|t| t.content.as_str())
            .collect();
        inputs.reverse();
        inputs
    }
}
