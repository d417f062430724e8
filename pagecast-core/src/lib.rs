//! # pagecast-core
//!
//! Pure logic for Pagecast (no I/O, instant tests).
//!
//! This crate holds the decision-making parts of a transfer and of the
//! station's display loop, without any network access or timers:
//! - [`AckTracker`] - collects per-record acknowledgments under an attempt budget
//! - [`BatchAdmission`] - decides whether an incoming record is accepted
//! - [`OnAir`] - picks the record on air and the records to evict
//!
//! The actual I/O is performed by `pagecast-client` and `pagecast-station`,
//! which feed events in and carry out the returned decisions.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ack;
pub mod admission;
pub mod schedule;

pub use ack::{AckEvent, AckOutcome, AckTracker, TransferSummary, DEFAULT_ACK_ATTEMPTS};
pub use admission::{BatchAdmission, Verdict};
pub use schedule::{OnAir, ScheduleAction, Window};
