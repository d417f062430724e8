//! Acceptance rule for records arriving in one batch.
//!
//! A record is refused with `DuplicateId` if its ID was accepted earlier in
//! the batch or is already stored, otherwise with `DuplicateTimestamp` if
//! a record accepted earlier in the same batch has the exact same
//! timestamp. Stored records are not checked for timestamp collisions.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use pagecast_types::{PageRecord, RecordId, RejectionReason};

/// Decision for one incoming record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Store the record.
    Accept,
    /// Refuse the record.
    Reject(RejectionReason),
}

impl Verdict {
    /// Whether the record is to be stored.
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept)
    }
}

/// Records accepted so far in the current batch.
#[derive(Debug, Clone, Default)]
pub struct BatchAdmission {
    ids: HashSet<RecordId>,
    timestamps: HashSet<NaiveDateTime>,
}

impl BatchAdmission {
    /// Start a new batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide on `record`; `id_stored` tells whether its ID is already held
    /// by the store. An accepted record joins the batch.
    pub fn admit(&mut self, record: &PageRecord, id_stored: bool) -> Verdict {
        let verdict = self.evaluate(record, id_stored);
        if verdict.is_accept() {
            self.ids.insert(record.id());
            self.timestamps.insert(record.timestamp());
        }
        verdict
    }

    fn evaluate(&self, record: &PageRecord, id_stored: bool) -> Verdict {
        if id_stored || self.ids.contains(&record.id()) {
            Verdict::Reject(RejectionReason::DuplicateId)
        } else if self.timestamps.contains(&record.timestamp()) {
            Verdict::Reject(RejectionReason::DuplicateTimestamp)
        } else {
            Verdict::Accept
        }
    }

    /// Number of records accepted in this batch.
    pub fn accepted(&self) -> usize {
        self.ids.len()
    }
}
