//! Error types for the serial protocol.

use thiserror::Error;
use tpmania_sequence::SequenceError;

/// Failures of the serial channel itself.
///
/// Any of these means the link can no longer be trusted; the session drops
/// the channel and reports the device as disconnected.
#[derive(Debug, Error)]
pub enum LinkError {
    /// I/O error on the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to open or configure the serial port.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// No port was configured.
    #[error("no serial port selected")]
    NoPortSelected,

    /// The channel was closed by the other side.
    #[error("channel closed")]
    Closed,
}

/// Result type alias for channel operations.
pub type LinkResult<T> = Result<T, LinkError>;

/// Faults that abort a transfer before it reaches a protocol outcome.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The serial link failed.
    #[error(transparent)]
    Link(#[from] LinkError),

    /// The source sequence could not be read.
    #[error("sequence error: {0}")]
    Sequence(#[from] SequenceError),

    /// The output file could not be written.
    #[error("file error: {0}")]
    File(#[from] std::io::Error),
}

/// Result type alias for protocol runs.
pub type TransferResult<T> = Result<T, TransferError>;
