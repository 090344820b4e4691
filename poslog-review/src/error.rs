//! Error types for poslog-review
//!
//! Consensus failures are per-line; index errors are integration bugs;
//! persistence errors leave the previous output untouched.

use thiserror::Error;

/// Review error type
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Tagger outputs missing, length-mismatched, or a malformed table row
    #[error("Invalid input: {0}")]
    Input(String),

    /// Unknown tagset or repair profile requested
    #[error("Unsupported tagset: {0}")]
    UnsupportedTagset(String),

    /// Item index outside the store
    #[error("Item index {index} out of range (store has {len} items)")]
    ItemOutOfRange { index: usize, len: usize },

    /// Token index outside an item
    #[error("Token index {token} out of range for item {index} ({len} tokens)")]
    TokenOutOfRange { index: usize, token: usize, len: usize },

    /// Operation targets the current item but none is selected
    #[error("No item selected")]
    NoItemSelected,

    /// Operation attempted after the session ended
    #[error("Session already finished")]
    SessionFinished,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// poslog-common error
    #[error("Common error: {0}")]
    Common(#[from] poslog_common::Error),
}

impl ReviewError {
    /// True for errors that signal a caller bug rather than bad data
    pub fn is_index_error(&self) -> bool {
        matches!(
            self,
            ReviewError::ItemOutOfRange { .. }
                | ReviewError::TokenOutOfRange { .. }
                | ReviewError::NoItemSelected
        )
    }
}

/// Result type for review operations
pub type ReviewResult<T> = Result<T, ReviewError>;
