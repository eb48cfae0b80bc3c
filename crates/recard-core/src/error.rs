//! Error types for recard.

use thiserror::Error;

/// Result type alias using recard's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for recard operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input (missing field, out-of-range value)
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Operation precondition not met (no snippet, AI unavailable)
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Uniqueness or concurrent-modification conflict
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Generation backend failed
    #[error("Generation error: {0}")]
    Generation(String),

    /// Operation exceeded its deadline
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
