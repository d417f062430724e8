//! Fixed-layout binary messages exchanged between sender and station.
//!
//! All integers are little-endian. Every message is a 1-byte tag plus a
//! fixed payload, except page headers and cell deltas, which follow an
//! announcement untagged.
//!
//! ```text
//! Announcement  [1][u16 count]
//! Accepted      [3][i32 id]
//! Rejected      [2][i32 id][u8 reason]
//! PageHeader    [i32 id][u16 year][u8 month][u8 day][u8 h][u8 m][u8 s][i32 duration][u16 cells]
//! CellDelta     [u16 x][u16 y][u16 sign][u8 fore][u8 back]
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::cell::{sign_code_unit, sign_from_code_unit};
use crate::{Cell, Color, PageError, PageRecord, RecordId};

/// Port the station listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 1234;

/// Size of a message tag.
pub const TAG_LEN: usize = 1;

/// Announcement payload: record count.
pub const ANNOUNCEMENT_PAYLOAD_LEN: usize = 2;

/// Accept payload: record ID.
pub const ACCEPT_PAYLOAD_LEN: usize = 4;

/// Reject payload: record ID and reason code.
pub const REJECT_PAYLOAD_LEN: usize = 5;

/// Encoded page header.
pub const PAGE_HEADER_LEN: usize = 17;

/// Encoded cell delta.
pub const CELL_DELTA_LEN: usize = 8;

/// Message kind carried in the tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Announcement of a record batch.
    TransferRecords,
    /// A record was rejected.
    RecordRejected,
    /// A record was accepted.
    RecordTransferred,
    /// Anything else, including an empty read. Never sent.
    Unknown,
}

impl MessageType {
    /// Decode the tag at the start of `bytes`; empty input is `Unknown`.
    pub fn from_tag(bytes: &[u8]) -> Self {
        bytes.first().copied().map_or(MessageType::Unknown, Self::from)
    }

    /// Tag byte, or `None` for `Unknown`.
    pub fn tag(self) -> Option<u8> {
        match self {
            MessageType::TransferRecords => Some(1),
            MessageType::RecordRejected => Some(2),
            MessageType::RecordTransferred => Some(3),
            MessageType::Unknown => None,
        }
    }

    /// Payload size that follows this tag, if it is a tagged message.
    pub fn payload_len(self) -> Option<usize> {
        match self {
            MessageType::TransferRecords => Some(ANNOUNCEMENT_PAYLOAD_LEN),
            MessageType::RecordRejected => Some(REJECT_PAYLOAD_LEN),
            MessageType::RecordTransferred => Some(ACCEPT_PAYLOAD_LEN),
            MessageType::Unknown => None,
        }
    }
}

impl From<u8> for MessageType {
    fn from(tag: u8) -> Self {
        match tag {
            1 => MessageType::TransferRecords,
            2 => MessageType::RecordRejected,
            3 => MessageType::RecordTransferred,
            _ => MessageType::Unknown,
        }
    }
}

/// Why the station refused a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RejectionReason {
    /// ID already seen in the batch or the store.
    DuplicateId = 1,
    /// Timestamp already seen in the batch.
    DuplicateTimestamp = 2,
}

impl TryFrom<u8> for RejectionReason {
    type Error = PageError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(RejectionReason::DuplicateId),
            2 => Ok(RejectionReason::DuplicateTimestamp),
            other => Err(PageError::InvalidRejectionReason(other)),
        }
    }
}

/// Check that `bytes` has exactly `expected` bytes.
fn exact(bytes: &[u8], expected: usize) -> Result<(), PageError> {
    let actual = bytes.len();
    if actual < expected {
        Err(PageError::StreamEnded { expected, actual })
    } else if actual > expected {
        Err(PageError::TrailingBytes { expected, actual })
    } else {
        Ok(())
    }
}

/// Batch announcement sent before the page data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Announcement {
    /// Records that follow.
    pub record_count: u16,
}

impl Announcement {
    /// Tag plus payload.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(TAG_LEN + ANNOUNCEMENT_PAYLOAD_LEN);
        buf.put_u8(1);
        buf.put_u16_le(self.record_count);
        buf.freeze()
    }

    /// Decode the payload that follows the tag.
    pub fn decode_payload(payload: &[u8]) -> Result<Self, PageError> {
        exact(payload, ANNOUNCEMENT_PAYLOAD_LEN)?;
        let mut buf = payload;
        Ok(Self {
            record_count: buf.get_u16_le(),
        })
    }
}

/// Per-record acknowledgment from the station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Record stored.
    Accepted {
        /// Record the response refers to.
        id: RecordId,
    },
    /// Record refused.
    Rejected {
        /// Record the response refers to.
        id: RecordId,
        /// Reason for refusal.
        reason: RejectionReason,
    },
}

impl Response {
    /// Record this response refers to.
    pub fn id(&self) -> RecordId {
        match self {
            Response::Accepted { id } | Response::Rejected { id, .. } => *id,
        }
    }

    /// Tag this response is sent with.
    pub fn message_type(&self) -> MessageType {
        match self {
            Response::Accepted { .. } => MessageType::RecordTransferred,
            Response::Rejected { .. } => MessageType::RecordRejected,
        }
    }

    /// Tag plus payload.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(TAG_LEN + REJECT_PAYLOAD_LEN);
        match self {
            Response::Accepted { id } => {
                buf.put_u8(3);
                buf.put_i32_le(id.value());
            }
            Response::Rejected { id, reason } => {
                buf.put_u8(2);
                buf.put_i32_le(id.value());
                buf.put_u8(*reason as u8);
            }
        }
        buf.freeze()
    }

    /// Decode the payload following a response tag.
    ///
    /// `message_type` must be `RecordTransferred` or `RecordRejected`.
    pub fn decode_payload(message_type: MessageType, payload: &[u8]) -> Result<Self, PageError> {
        match message_type {
            MessageType::RecordTransferred => {
                exact(payload, ACCEPT_PAYLOAD_LEN)?;
                let mut buf = payload;
                Ok(Response::Accepted {
                    id: RecordId::new(buf.get_i32_le()),
                })
            }
            MessageType::RecordRejected => {
                exact(payload, REJECT_PAYLOAD_LEN)?;
                let mut buf = payload;
                let id = RecordId::new(buf.get_i32_le());
                let reason = RejectionReason::try_from(buf.get_u8())?;
                Ok(Response::Rejected { id, reason })
            }
            other => Err(PageError::InvalidRecord(format!(
                "{other:?} is not a response"
            ))),
        }
    }
}

/// Fixed-size header preceding each record's cell deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    /// Record ID.
    pub id: RecordId,
    /// Window start, second precision.
    pub timestamp: NaiveDateTime,
    /// Window length in seconds.
    pub duration_secs: i32,
    /// Cell deltas that follow.
    pub cell_count: u16,
}

impl PageHeader {
    /// Header describing `record`.
    pub fn for_record(record: &PageRecord) -> Self {
        Self {
            id: record.id(),
            timestamp: record.timestamp(),
            duration_secs: record.duration_secs(),
            // At most 80 * 25 cells.
            cell_count: record.non_empty_count() as u16,
        }
    }

    /// Encode into exactly [`PAGE_HEADER_LEN`] bytes.
    ///
    /// Years outside `0..=65535` are clamped; they cannot be expressed on the
    /// wire.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(PAGE_HEADER_LEN);
        self.encode_into(&mut buf);
        buf.freeze()
    }

    /// Append the encoded header to `buf`.
    pub fn encode_into(&self, buf: &mut impl BufMut) {
        let ts = self.timestamp;
        buf.put_i32_le(self.id.value());
        buf.put_u16_le(ts.year().clamp(0, i32::from(u16::MAX)) as u16);
        buf.put_u8(ts.month() as u8);
        buf.put_u8(ts.day() as u8);
        buf.put_u8(ts.hour() as u8);
        buf.put_u8(ts.minute() as u8);
        buf.put_u8(ts.second() as u8);
        buf.put_i32_le(self.duration_secs);
        buf.put_u16_le(self.cell_count);
    }

    /// Decode exactly [`PAGE_HEADER_LEN`] bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, PageError> {
        exact(bytes, PAGE_HEADER_LEN)?;
        let mut buf = bytes;
        let id = RecordId::new(buf.get_i32_le());
        let year = buf.get_u16_le();
        let (month, day) = (buf.get_u8(), buf.get_u8());
        let (hour, minute, second) = (buf.get_u8(), buf.get_u8(), buf.get_u8());
        let timestamp = NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
            .and_then(|d| d.and_hms_opt(u32::from(hour), u32::from(minute), u32::from(second)))
            .ok_or_else(|| {
                PageError::InvalidTimestamp(format!(
                    "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
                ))
            })?;
        Ok(Self {
            id,
            timestamp,
            duration_secs: buf.get_i32_le(),
            cell_count: buf.get_u16_le(),
        })
    }

    /// A record with this header's fields and an all-blank grid, ready for
    /// its cell deltas.
    pub fn into_blank_record(self) -> PageRecord {
        PageRecord::blank(self.id, self.timestamp, self.duration_secs)
    }
}

/// One non-empty cell on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellDelta {
    /// Column.
    pub x: u16,
    /// Row.
    pub y: u16,
    /// UTF-16 code unit of the sign.
    pub sign: u16,
    /// Foreground palette index.
    pub fore: u8,
    /// Background palette index.
    pub back: u8,
}

impl CellDelta {
    /// Delta carrying `cell`'s coordinates, sign and colors.
    pub fn from_cell(cell: &Cell) -> Self {
        Self {
            x: cell.x(),
            y: cell.y(),
            // Cells only ever hold single-unit signs.
            sign: sign_code_unit(cell.sign()).unwrap_or(u16::from(b'?')),
            fore: cell.fore().index(),
            back: cell.back().index(),
        }
    }

    /// Encode into exactly [`CELL_DELTA_LEN`] bytes.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(CELL_DELTA_LEN);
        self.encode_into(&mut buf);
        buf.freeze()
    }

    /// Append the encoded delta to `buf`.
    pub fn encode_into(&self, buf: &mut impl BufMut) {
        buf.put_u16_le(self.x);
        buf.put_u16_le(self.y);
        buf.put_u16_le(self.sign);
        buf.put_u8(self.fore);
        buf.put_u8(self.back);
    }

    /// Decode exactly [`CELL_DELTA_LEN`] bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, PageError> {
        exact(bytes, CELL_DELTA_LEN)?;
        let mut buf = bytes;
        Ok(Self {
            x: buf.get_u16_le(),
            y: buf.get_u16_le(),
            sign: buf.get_u16_le(),
            fore: buf.get_u8(),
            back: buf.get_u8(),
        })
    }

    /// Validate into a non-empty [`Cell`].
    pub fn to_cell(&self) -> Result<Cell, PageError> {
        Cell::new(
            i64::from(self.x),
            i64::from(self.y),
            sign_from_code_unit(self.sign)?,
            Color::try_from(self.fore)?,
            Color::try_from(self.back)?,
        )
    }

    /// Validate and overwrite the matching cell of `record`.
    pub fn apply_to(&self, record: &mut PageRecord) -> Result<(), PageError> {
        let cell = self.to_cell()?;
        record.grid_mut().apply(&cell);
        Ok(())
    }
}

/// Header followed by one delta per non-empty cell, row-major.
pub fn encode_page(record: &PageRecord) -> Bytes {
    let header = PageHeader::for_record(record);
    let mut buf =
        BytesMut::with_capacity(PAGE_HEADER_LEN + CELL_DELTA_LEN * usize::from(header.cell_count));
    header.encode_into(&mut buf);
    for cell in record.non_empty_cells() {
        CellDelta::from_cell(cell).encode_into(&mut buf);
    }
    buf.freeze()
}
