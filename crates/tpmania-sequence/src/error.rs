//! Error types for sequence file handling.

use thiserror::Error;

/// Errors that can occur when reading or writing sequence files.
#[derive(Debug, Error)]
pub enum SequenceError {
    /// I/O error reading or writing a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document has no source file to read beats from.
    #[error("sequence has no source file")]
    MissingPath,
}

/// Result type alias for sequence operations.
pub type SequenceResult<T> = Result<T, SequenceError>;
