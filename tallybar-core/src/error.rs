//! Core error types for Tallybar.

use thiserror::Error;

/// Core error type for Tallybar operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A reset timestamp could not be parsed.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
