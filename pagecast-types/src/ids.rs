//! Identity type for page records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric identifier of a page record.
///
/// Uniqueness within a working set is the responsibility of whoever
/// composes the records; the station only rejects IDs it already holds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct RecordId(i32);

impl RecordId {
    /// Create a RecordId with the given value.
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    /// Get the numeric value of this RecordId.
    pub fn value(&self) -> i32 {
        self.0
    }
}

impl From<i32> for RecordId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}
