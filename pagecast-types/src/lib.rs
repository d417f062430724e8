//! # pagecast-types
//!
//! Data model and encodings shared by every Pagecast crate:
//! - [`PageRecord`], [`Grid`], [`Cell`], [`Color`], [`RecordId`] - the page model
//! - [`text`] - the `id;timestamp;duration;cells` line format
//! - [`wire`] - fixed-layout little-endian transfer messages
//! - [`PageError`] - error type

#![warn(missing_docs)]
#![warn(clippy::all)]

mod cell;
mod error;
mod ids;
mod record;
pub mod text;
pub mod wire;

pub use cell::{is_supported_sign, sign_code_unit, sign_from_code_unit, Cell, Color};
pub use error::PageError;
pub use ids::RecordId;
pub use record::{Grid, PageRecord, COLUMNS, DEFAULT_DURATION_SECS, ROWS};
pub use text::{export_record, parse_record, parse_records};
pub use wire::{MessageType, RejectionReason, Response, DEFAULT_PORT};
