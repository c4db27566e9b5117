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
    clippy::missing_errors_doc
)]

//! Bounded conversation memory.
//!
//! Two windows decide what of the conversation so far reaches the next
//! prompt:
//! - [`SnippetWindow`] keeps the most recently retrieved unique document
//!   snippets.
//! - [`MessageWindow`] selects recent turns for continuity and recent user
//!   inputs for the retrieval query.
//!
//! [`HistoryMemory`] and [`SnippetMemory`] expose them to the prompt
//! assembler as [`MemorySource`](docqa_core::MemorySource)s.

mod message_window;
mod snippet_window;
mod sources;

pub use message_window::{MessageWindow, MessageWindowConfig};
pub use snippet_window::{DEFAULT_SNIPPET_WINDOW_SIZE, SnippetWindow};
pub use sources::{HistoryMemory, SnippetMemory};
