//! Error types for trait operations.

use thiserror::Error;

/// Common error type for source and sink operations.
#[derive(Debug, Error)]
pub enum TraitError {
    /// Requested resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Source not available
    #[error("source not available: {0}")]
    SourceNotAvailable(String),

    /// Parse/deserialization error
    #[error("parse error: {0}")]
    ParseError(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Invalid input
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl TraitError {
    /// Classifies an I/O failure on `target`: a missing file is
    /// [`NotFound`](Self::NotFound), anything else is [`IoError`](Self::IoError).
    pub fn io(target: impl std::fmt::Display, e: &std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(target.to_string()),
            _ => Self::IoError(format!("{target}: {e}")),
        }
    }
}
