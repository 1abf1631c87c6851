//! Error types for the command-line host.

use thiserror::Error;
use tpmania_sequence::SequenceError;
use tpmania_serial_protocol::LinkError;

/// Errors that stop a command before or around a device operation.
///
/// Device outcomes themselves are reported as a `TransferStatus`, not as
/// an error.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file is missing or invalid.
    #[error("config error: {0}")]
    Config(String),

    /// Configuration file is not valid YAML.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON output failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Sequence file could not be read.
    #[error("sequence error: {0}")]
    Sequence(#[from] SequenceError),

    /// Serial port could not be opened.
    #[error("serial link error: {0}")]
    Link(#[from] LinkError),

    /// Audio file could not be read.
    #[error("audio error: {0}")]
    Audio(#[from] hound::Error),

    /// Invalid combination of arguments or files.
    #[error("{0}")]
    Usage(String),

    /// A device operation is already running, or its thread failed.
    #[error("task error: {0}")]
    Task(String),
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
