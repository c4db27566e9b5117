//! Error taxonomy shared by every crate in the workspace.
//!
//! Configuration and template errors are raised before any external call
//! is made. Retrieval errors abort a turn without touching conversation
//! state. Generation errors never leave the conversation driver; they are
//! turned into a fallback reply there.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("User input is empty")]
    EmptyInput,

    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unknown placeholder `{{{name}}}` at byte {position}")]
    UnknownPlaceholder { name: String, position: usize },

    #[error("Unclosed `{{` at byte {0}")]
    UnclosedBrace(usize),

    #[error("Unmatched `}}` at byte {0}")]
    UnmatchedClosingBrace(usize),

    #[error("Empty placeholder at byte {0}")]
    EmptyPlaceholder(usize),
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("Failed to extract text from {url}: {reason}")]
    Extraction { url: String, reason: String },

    #[error("Failed to embed content of {url}: {reason}")]
    Embedding { url: String, reason: String },

    #[error("No document could be indexed")]
    NoDocuments,

    #[error("Snippet query failed for {query:?}: {source}")]
    Query {
        query: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Snippet retrieval timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Text generation provider error: {0}")]
    Provider(#[from] anyhow::Error),

    #[error("Empty response from text generation provider")]
    EmptyResponse,

    #[error("Text generation timed out after {0:?}")]
    Timeout(Duration),
}

/// Failures that end a conversation turn without a reply.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_placeholder_message_shows_braces() {
        let err = TemplateError::UnknownPlaceholder {
            name: "context".to_string(),
            position: 3,
        };
        assert_eq!(err.to_string(), "Unknown placeholder `{context}` at byte 3");
    }

    #[test]
    fn turn_error_is_transparent() {
        let err = TurnError::from(ConfigurationError::EmptyInput);
        assert_eq!(err.to_string(), "User input is empty");
    }
}
