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

//! Grounded multi-turn question answering over indexed documents.
//!
//! Each turn retrieves snippets for the recent user questions, merges them
//! into a bounded deduplicated snippet window, renders a prompt from the
//! snippets and the recent history, and records the exchange.
//!
//! # Key Features
//! - One explicit conversation instance per session, no shared state
//! - Independent history and retrieval-query windows
//! - Placeholder-checked prompt templates
//! - Generation failures degrade to a fixed fallback reply

mod manager;
mod prompt;
mod session;

pub use manager::{
    ConversationConfig, ConversationManager, FALLBACK_REPLY, TurnReply, TurnUsage, print_snippets,
};
pub use prompt::{DEFAULT_PROMPT_TEMPLATE, PromptTemplate, assemble};
pub use session::ConversationSession;
