//! Line-oriented text form of page records.
//!
//! A record is `id;timestamp;duration;cell#cell#...` and a cell is
//! `x,y,fore,back,sign`. Only non-empty cells are written. Cells are read
//! positionally (four integers, then exactly one character), so signs such
//! as `,`, `;` or `#` survive a round trip.

use chrono::NaiveDateTime;

use crate::{Cell, Color, Grid, PageError, PageRecord, RecordId};

/// Timestamp layout used in exported records.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ISO_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Format a timestamp the way records are exported.
pub fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse `YYYY-MM-DD HH:MM:SS` (a `T` separator is accepted too).
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, PageError> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, ISO_TIMESTAMP_FORMAT))
        .map_err(|e| PageError::InvalidTimestamp(format!("{s:?}: {e}")))
}

/// Text form of one cell.
pub fn export_cell(cell: &Cell) -> String {
    format!(
        "{},{},{},{},{}",
        cell.x(),
        cell.y(),
        cell.fore().index(),
        cell.back().index(),
        cell.sign()
    )
}

/// Parse one cell; the whole input must be consumed.
pub fn parse_cell(s: &str) -> Result<Cell, PageError> {
    let (cell, rest) = parse_cell_prefix(s)?;
    if !rest.is_empty() {
        return Err(PageError::InvalidCell(format!(
            "unexpected text after sign: {rest:?}"
        )));
    }
    Ok(cell)
}

fn parse_cell_prefix(s: &str) -> Result<(Cell, &str), PageError> {
    let mut rest = s;
    let mut fields = [0i64; 4];
    for field in fields.iter_mut() {
        let (raw, remainder) = rest
            .split_once(',')
            .ok_or_else(|| PageError::InvalidCell(format!("too few fields in {s:?}")))?;
        *field = raw
            .trim()
            .parse()
            .map_err(|_| PageError::InvalidCell(format!("not a number: {raw:?}")))?;
        rest = remainder;
    }
    let mut chars = rest.chars();
    let sign = chars
        .next()
        .ok_or_else(|| PageError::InvalidCell(format!("missing sign in {s:?}")))?;
    let [x, y, fore, back] = fields;
    let cell = Cell::new(x, y, sign, Color::from_index(fore)?, Color::from_index(back)?)?;
    Ok((cell, chars.as_str()))
}

fn parse_cells(list: &str) -> Result<Vec<Cell>, PageError> {
    let mut cells = Vec::new();
    let mut rest = list;
    while !rest.is_empty() {
        let (cell, remainder) = parse_cell_prefix(rest)?;
        cells.push(cell);
        rest = if remainder.is_empty() {
            remainder
        } else {
            match remainder.strip_prefix('#') {
                Some(next) if !next.is_empty() => next,
                Some(_) => {
                    return Err(PageError::InvalidCell("trailing cell separator".into()));
                }
                None => {
                    return Err(PageError::InvalidCell(format!(
                        "expected '#' between cells, found {remainder:?}"
                    )));
                }
            }
        };
    }
    Ok(cells)
}

/// Text form of a record: header fields followed by its non-empty cells.
pub fn export_record(record: &PageRecord) -> String {
    let cells: Vec<String> = record.non_empty_cells().map(export_cell).collect();
    format!(
        "{};{};{};{}",
        record.id(),
        format_timestamp(record.timestamp()),
        record.duration_secs(),
        cells.join("#")
    )
}

/// Parse one record line. Any malformed part fails the whole record.
pub fn parse_record(line: &str) -> Result<PageRecord, PageError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut parts = line.splitn(4, ';');
    let mut next_field = |name: &str| {
        parts
            .next()
            .ok_or_else(|| PageError::InvalidRecord(format!("missing {name} field")))
    };

    let id_field = next_field("id")?;
    let id: i32 = id_field
        .trim()
        .parse()
        .map_err(|_| PageError::InvalidRecord(format!("bad id {id_field:?}")))?;
    let timestamp = parse_timestamp(next_field("timestamp")?)?;
    let duration_field = next_field("duration")?;
    let duration_secs: i32 = duration_field
        .trim()
        .parse()
        .map_err(|_| PageError::InvalidRecord(format!("bad duration {duration_field:?}")))?;
    let cells = match parts.next() {
        Some(list) => parse_cells(list)?,
        None => Vec::new(),
    };

    let mut grid = Grid::blank();
    for cell in &cells {
        grid.apply(cell);
    }
    Ok(PageRecord::new(RecordId::new(id), timestamp, duration_secs, grid))
}

/// Text form of many records, one per line.
pub fn export_records<'a>(records: impl IntoIterator<Item = &'a PageRecord>) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&export_record(record));
        out.push('\n');
    }
    out
}

/// A line of a record file that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    /// 1-based line number.
    pub line: usize,
    /// What went wrong.
    pub error: PageError,
}

/// Parse a multi-line record file, skipping blank lines.
///
/// Good records and malformed lines are both returned so the caller can
/// decide whether to skip or abort.
pub fn parse_records(text: &str) -> (Vec<PageRecord>, Vec<LineError>) {
    let mut records = Vec::new();
    let mut errors = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_record(line) {
            Ok(record) => records.push(record),
            Err(error) => errors.push(LineError {
                line: index + 1,
                error,
            }),
        }
    }
    (records, errors)
}

impl std::str::FromStr for PageRecord {
    type Err = PageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_record(s)
    }
}
