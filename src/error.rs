//! Error types for wordbank
//!
//! Provides a unified error type for storage, transport and quiz operations.

use thiserror::Error;

/// Result type alias using WordbankError
pub type Result<T> = std::result::Result<T, WordbankError>;

/// Unified error type for wordbank operations
#[derive(Debug, Error)]
pub enum WordbankError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    /// Returned by every `get*` on an absent key, on every backend.
    #[error("not found")]
    NotFound,

    #[error("{op} failed for '{key}': {message}")]
    Backend {
        op: &'static str,
        key: String,
        message: String,
    },

    #[error("operation timed out: {0}")]
    Timeout(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("malformed record '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Quiz Errors
    // -------------------------------------------------------------------------
    #[error("user dictionary is empty")]
    EmptyDictionary,

    #[error("not enough words: need {needed}, have {available}")]
    NotEnoughWords { needed: usize, available: usize },

    #[error("invalid choice {choice} for a quiz with {choices} choices")]
    InvalidChoice { choice: usize, choices: usize },

    #[error("quiz result already set")]
    AlreadyAnswered,

    #[error("quiz {0} belongs to another user")]
    ForeignQuiz(String),

    #[error("invalid quiz reply: {0}")]
    InvalidReply(String),

    #[error("invalid word '{0}': only single words are supported")]
    InvalidWord(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl WordbankError {
    /// True for the distinguished "absent key" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, WordbankError::NotFound)
    }

    pub(crate) fn backend(op: &'static str, key: impl Into<String>, err: impl std::fmt::Display) -> Self {
        WordbankError::Backend {
            op,
            key: key.into(),
            message: err.to_string(),
        }
    }

    pub(crate) fn serialization(key: impl Into<String>, source: serde_json::Error) -> Self {
        WordbankError::Serialization {
            key: key.into(),
            source,
        }
    }
}
