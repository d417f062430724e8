//! # pagecast-station
//!
//! Receiving station for Pagecast.
//!
//! This crate implements the station that:
//! - Accepts TCP connections from senders (default port 1234)
//! - Decodes announced record batches and answers every record
//! - Keeps accepted records in an in-memory store
//! - Puts the newest active record on air and evicts expired ones
//! - Takes operator commands (rendering switch, status) from stdin
//!
//! ## Architecture
//!
//! ```text
//! Sender A ──┐                      ┌── on-air display
//!            │       TCP            │
//!            ├──────────────►┌──────┴───────────────┐
//! Sender B ──┘               │   pagecast-station   │
//!                            │  session per peer    │
//!                            │  RecordStore (mutex) │
//!                            │  scheduler tick      │
//!                            └──────────────────────┘
//! ```
//!
//! ## Protocol
//!
//! - TRANSFER_RECORDS (count) → one page per record
//! - each page → RECORD_TRANSFERRED or RECORD_REJECTED, in order

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod control;
pub mod error;
pub mod protocol;
pub mod scheduler;
pub mod server;
pub mod session;
pub mod store;

pub use config::Config;
pub use error::{ProtocolError, StationError};
pub use scheduler::{spawn_scheduler, Scheduler};
pub use server::{MetricsSnapshot, Station, StationEvent, StationMetrics};
pub use session::Session;
pub use store::RecordStore;
