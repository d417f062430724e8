//! Page records: a timestamped, time-windowed 80x25 grid of cells.

use chrono::{Local, NaiveDateTime, TimeDelta, Timelike};
use std::hash::{Hash, Hasher};

use crate::{Cell, Color, PageError, RecordId};

/// Grid width.
pub const COLUMNS: usize = 80;

/// Grid height.
pub const ROWS: usize = 25;

/// Duration of a freshly created record, in seconds.
pub const DEFAULT_DURATION_SECS: i32 = 60;

/// A fully populated `COLUMNS x ROWS` grid, stored row-major.
///
/// Every position always holds a [`Cell`]; blank positions are placeholders
/// with `is_empty() == true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Cell>,
}

impl Grid {
    /// A grid where every cell is blank.
    pub fn blank() -> Self {
        let mut cells = Vec::with_capacity(COLUMNS * ROWS);
        for y in 0..ROWS {
            for x in 0..COLUMNS {
                // Bounded by the 80x25 grid.
                cells.push(Cell::blank(x as u16, y as u16));
            }
        }
        Self { cells }
    }

    fn index(x: usize, y: usize) -> Option<usize> {
        (x < COLUMNS && y < ROWS).then_some(y * COLUMNS + x)
    }

    /// Cell at `(x, y)`, if inside the grid.
    pub fn get(&self, x: usize, y: usize) -> Option<&Cell> {
        Self::index(x, y).map(|i| &self.cells[i])
    }

    /// Mutable cell at `(x, y)`, if inside the grid.
    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut Cell> {
        Self::index(x, y).map(move |i| &mut self.cells[i])
    }

    /// Overwrite the cell at `cell`'s coordinates with its sign and colors.
    pub fn apply(&mut self, cell: &Cell) {
        if let Some(target) = self.get_mut(cell.x() as usize, cell.y() as usize) {
            target.overwrite_from(cell);
        }
    }

    /// Set sign and both colors of the cell at `(x, y)` in one step.
    pub fn modify(
        &mut self,
        x: i64,
        y: i64,
        sign: char,
        fore: Color,
        back: Color,
    ) -> Result<(), PageError> {
        let cell = Cell::new(x, y, sign, fore, back)?;
        self.apply(&cell);
        Ok(())
    }

    /// Write `text` starting at `(x, y)` with the given colors.
    ///
    /// A `\n` continues on the next row at column `x`. Characters past the
    /// right or bottom edge are clipped. Control characters and characters
    /// outside the Basic Multilingual Plane become `?`. Returns the number of
    /// cells written.
    pub fn write_text(&mut self, x: usize, y: usize, text: &str, fore: Color, back: Color) -> usize {
        let mut written = 0;
        for (row_offset, line) in text.split('\n').enumerate() {
            let row = y + row_offset;
            if row >= ROWS {
                break;
            }
            for (col_offset, ch) in line.trim_end_matches('\r').chars().enumerate() {
                let Some(cell) = self.get_mut(x + col_offset, row) else {
                    break;
                };
                let sign = if crate::cell::is_supported_sign(ch) { ch } else { '?' };
                if cell.set_sign(sign).is_ok() {
                    cell.set_fore(fore);
                    cell.set_back(back);
                    written += 1;
                }
            }
        }
        written
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Non-empty cells in row-major order.
    pub fn non_empty_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| !c.is_empty())
    }

    /// Number of non-empty cells.
    pub fn non_empty_count(&self) -> usize {
        self.non_empty_cells().count()
    }

    /// Rows of cells, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(COLUMNS)
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::blank()
    }
}

/// A broadcast page with its time window.
///
/// Equality and hashing look at the ID only; two records with the same ID
/// are duplicates regardless of content.
#[derive(Debug, Clone)]
pub struct PageRecord {
    id: RecordId,
    timestamp: NaiveDateTime,
    duration_secs: i32,
    grid: Grid,
}

impl PageRecord {
    /// Create a record; the timestamp is truncated to whole seconds.
    pub fn new(id: RecordId, timestamp: NaiveDateTime, duration_secs: i32, grid: Grid) -> Self {
        Self {
            id,
            timestamp: truncate_to_seconds(timestamp),
            duration_secs,
            grid,
        }
    }

    /// A blank record stamped with the current local time and the default
    /// duration.
    pub fn empty(id: RecordId) -> Self {
        Self::new(id, Local::now().naive_local(), DEFAULT_DURATION_SECS, Grid::blank())
    }

    /// A blank record with the given window.
    pub fn blank(id: RecordId, timestamp: NaiveDateTime, duration_secs: i32) -> Self {
        Self::new(id, timestamp, duration_secs, Grid::blank())
    }

    /// Record ID.
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Start of the active window.
    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Length of the active window in seconds.
    pub fn duration_secs(&self) -> i32 {
        self.duration_secs
    }

    /// The cell grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Mutable access for editors.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Move the window start; truncated to whole seconds.
    pub fn set_timestamp(&mut self, timestamp: NaiveDateTime) {
        self.timestamp = truncate_to_seconds(timestamp);
    }

    /// Change the window length.
    pub fn set_duration_secs(&mut self, duration_secs: i32) {
        self.duration_secs = duration_secs;
    }

    /// End of the active window (`timestamp + duration`).
    pub fn end(&self) -> NaiveDateTime {
        let delta = TimeDelta::seconds(i64::from(self.duration_secs));
        self.timestamp.checked_add_signed(delta).unwrap_or(if self.duration_secs >= 0 {
            NaiveDateTime::MAX
        } else {
            NaiveDateTime::MIN
        })
    }

    /// Whether `now` lies within `[timestamp, timestamp + duration]`.
    pub fn is_active_at(&self, now: NaiveDateTime) -> bool {
        self.timestamp <= now && now <= self.end()
    }

    /// Whether `now` is strictly past the window end.
    pub fn is_expired_at(&self, now: NaiveDateTime) -> bool {
        now > self.end()
    }

    /// Non-empty cells in row-major order.
    pub fn non_empty_cells(&self) -> impl Iterator<Item = &Cell> {
        self.grid.non_empty_cells()
    }

    /// Number of non-empty cells.
    pub fn non_empty_count(&self) -> usize {
        self.grid.non_empty_count()
    }

    /// Plain-text rows of the grid, trailing blanks trimmed.
    pub fn render_lines(&self) -> Vec<String> {
        self.grid
            .rows()
            .map(|row| {
                let line: String = row.iter().map(Cell::sign).collect();
                line.trim_end().to_string()
            })
            .collect()
    }
}

impl PartialEq for PageRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PageRecord {}

impl Hash for PageRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

fn truncate_to_seconds(timestamp: NaiveDateTime) -> NaiveDateTime {
    timestamp.with_nanosecond(0).unwrap_or(timestamp)
}
