//! Error types for Pagecast.

use thiserror::Error;

/// Errors produced while building, parsing or decoding page records.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PageError {
    /// Text record could not be parsed
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Text cell could not be parsed
    #[error("invalid cell: {0}")]
    InvalidCell(String),

    /// Color index outside the 16-color palette
    #[error("invalid color index: {0}")]
    InvalidColor(i64),

    /// Cell coordinates outside the grid
    #[error("cell ({x}, {y}) is outside the {columns}x{rows} grid")]
    CellOutOfBounds {
        /// Column.
        x: i64,
        /// Row.
        y: i64,
        /// Grid width.
        columns: usize,
        /// Grid height.
        rows: usize,
    },

    /// Character does not fit a single UTF-16 code unit
    #[error("sign {0:?} is not a single UTF-16 code unit")]
    UnsupportedSign(char),

    /// Code unit on the wire is not a character on its own
    #[error("sign code unit {0:#06x} is not a valid character")]
    InvalidSignCodeUnit(u16),

    /// Impossible calendar date or time
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Reject reason outside the known set
    #[error("invalid rejection reason: {0}")]
    InvalidRejectionReason(u8),

    /// Fewer bytes than the fixed layout requires
    #[error("stream ended early: expected {expected} bytes, got {actual}")]
    StreamEnded {
        /// Bytes the layout requires.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// More bytes than the fixed layout allows
    #[error("unexpected trailing bytes: expected {expected} bytes, got {actual}")]
    TrailingBytes {
        /// Bytes the layout requires.
        expected: usize,
        /// Bytes actually supplied.
        actual: usize,
    },
}
