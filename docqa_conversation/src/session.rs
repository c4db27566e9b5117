//! The turn log of a single conversation.
//!
//! A session lives only as long as its conversation instance; nothing is
//! persisted.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use docqa_core::Turn;

/// Ordered, append-only log of user and assistant turns.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    /// Session identifier
    pub id: Uuid,
    /// Session name (optional)
    pub name: Option<String>,
    turns: Vec<Turn>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl ConversationSession {
    /// Create a new empty conversation session.
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: None,
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn add_turn(&mut self, turn: Turn) {
        self.turns.push(turn);
        self.updated_at = Utc::now();
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[must_use]
    pub const fn turn_count(&self) -> usize {
        self.turns.len()
    }

    /// Number of completed user/assistant exchanges.
    #[must_use]
    pub const fn exchange_count(&self) -> usize {
        self.turns.len() / 2
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
        self.updated_at = Utc::now();
    }
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new()
    }
}
