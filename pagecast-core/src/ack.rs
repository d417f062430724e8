//! Acknowledgment collection for a sent batch.
//!
//! After a batch has been written, the sender polls for responses until
//! every record is acknowledged or the attempt budget runs out. This module
//! holds the bookkeeping for that loop; the caller performs the polling and
//! feeds the results in as [`AckEvent`]s.

use pagecast_types::{RecordId, RejectionReason, Response};

/// Attempt budget used when none is configured.
pub const DEFAULT_ACK_ATTEMPTS: u32 = 5;

/// Final tally of a transfer.
///
/// `accepted + rejected + unconfirmed` always equals the number of records
/// that were sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransferSummary {
    /// Records the station stored.
    pub accepted: usize,
    /// Records the station refused.
    pub rejected: usize,
    /// Records without any acknowledgment.
    pub unconfirmed: usize,
}

impl TransferSummary {
    /// Number of records the summary covers.
    pub fn total(&self) -> usize {
        self.accepted + self.rejected + self.unconfirmed
    }
}

/// What one polling round produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckEvent {
    /// No data arrived within the poll interval.
    Idle,
    /// A decoded response.
    Response(Response),
    /// Data arrived but was not a usable response (unknown tag, bad payload).
    Void,
    /// The peer closed the connection.
    PeerClosed,
}

/// Outcome for one sent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// Station stored the record.
    Accepted {
        /// Position of the record in the sent batch.
        index: usize,
        /// Record ID.
        id: RecordId,
    },
    /// Station refused the record because its ID was taken.
    RejectedDuplicateId {
        /// Position of the record in the sent batch.
        index: usize,
        /// Record ID.
        id: RecordId,
    },
    /// Station refused the record because its timestamp was taken.
    RejectedDuplicateTimestamp {
        /// Position of the record in the sent batch.
        index: usize,
        /// Record ID.
        id: RecordId,
    },
}

impl AckOutcome {
    /// Position of the record in the sent batch.
    pub fn index(&self) -> usize {
        match self {
            AckOutcome::Accepted { index, .. }
            | AckOutcome::RejectedDuplicateId { index, .. }
            | AckOutcome::RejectedDuplicateTimestamp { index, .. } => *index,
        }
    }
}

/// Tracks which sent records have been acknowledged and how many empty
/// polling rounds are left.
#[derive(Debug, Clone)]
pub struct AckTracker {
    ids: Vec<RecordId>,
    acked: Vec<bool>,
    max_attempts: u32,
    remaining_attempts: u32,
    accepted: usize,
    rejected: usize,
    peer_closed: bool,
}

impl AckTracker {
    /// Track `ids` (in send order) with the default budget.
    pub fn new(ids: impl IntoIterator<Item = RecordId>) -> Self {
        Self::with_attempts(ids, DEFAULT_ACK_ATTEMPTS)
    }

    /// Track `ids` (in send order) with a custom budget.
    pub fn with_attempts(ids: impl IntoIterator<Item = RecordId>, attempts: u32) -> Self {
        let ids: Vec<RecordId> = ids.into_iter().collect();
        let acked = vec![false; ids.len()];
        Self {
            ids,
            acked,
            max_attempts: attempts,
            remaining_attempts: attempts,
            accepted: 0,
            rejected: 0,
            peer_closed: false,
        }
    }

    /// Feed one polling round.
    ///
    /// Returns the outcome when a response matched an outstanding record.
    /// An idle round spends one attempt; a matched response restores the
    /// full budget. A response for an ID with nothing outstanding is ignored
    /// like any other void round.
    pub fn on_event(&mut self, event: AckEvent) -> Option<AckOutcome> {
        match event {
            AckEvent::Idle => {
                self.remaining_attempts = self.remaining_attempts.saturating_sub(1);
                None
            }
            AckEvent::Void => None,
            AckEvent::PeerClosed => {
                self.peer_closed = true;
                None
            }
            AckEvent::Response(response) => {
                let id = response.id();
                let index = self
                    .ids
                    .iter()
                    .zip(&self.acked)
                    .position(|(candidate, acked)| *candidate == id && !acked)?;
                self.acked[index] = true;
                self.remaining_attempts = self.max_attempts;
                Some(match response {
                    Response::Accepted { .. } => {
                        self.accepted += 1;
                        AckOutcome::Accepted { index, id }
                    }
                    Response::Rejected {
                        reason: RejectionReason::DuplicateId,
                        ..
                    } => {
                        self.rejected += 1;
                        AckOutcome::RejectedDuplicateId { index, id }
                    }
                    Response::Rejected {
                        reason: RejectionReason::DuplicateTimestamp,
                        ..
                    } => {
                        self.rejected += 1;
                        AckOutcome::RejectedDuplicateTimestamp { index, id }
                    }
                })
            }
        }
    }

    /// Whether the wait is over: everything acknowledged, budget spent, or
    /// the peer gone.
    pub fn is_done(&self) -> bool {
        self.pending() == 0 || self.remaining_attempts == 0 || self.peer_closed
    }

    /// Records still waiting for an acknowledgment.
    pub fn pending(&self) -> usize {
        self.ids.len() - self.accepted - self.rejected
    }

    /// Empty rounds left before giving up.
    pub fn remaining_attempts(&self) -> u32 {
        self.remaining_attempts
    }

    /// Whether the peer closed during the wait.
    pub fn peer_closed(&self) -> bool {
        self.peer_closed
    }

    /// Tally so far; outstanding records count as unconfirmed.
    pub fn summary(&self) -> TransferSummary {
        TransferSummary {
            accepted: self.accepted,
            rejected: self.rejected,
            unconfirmed: self.pending(),
        }
    }
}
