//! Error types for pagecast-station.

use pagecast_types::PageError;

/// Main error type for pagecast-station operations.
#[derive(Debug, thiserror::Error)]
pub enum StationError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Protocol layer errors.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Stream ended in the middle of a batch.
    #[error("stream ended inside a batch: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Bytes the current message needs.
        expected: usize,
        /// Bytes received before the end.
        actual: usize,
    },

    /// Received bytes do not form a valid message.
    #[error("invalid message: {0}")]
    InvalidMessage(#[from] PageError),

    /// Connection error.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),
}

/// Result type alias for station operations.
pub type Result<T> = std::result::Result<T, StationError>;

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;
