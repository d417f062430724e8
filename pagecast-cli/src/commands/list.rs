//! List the records in the record file.

use anyhow::Result;
use pagecast_types::text::format_timestamp;
use pagecast_types::PageRecord;
use serde::Serialize;
use std::path::Path;

use crate::pages::PageFile;

/// One listed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListEntry {
    /// Record ID.
    pub id: i32,
    /// Window start.
    pub start: String,
    /// Window end.
    pub end: String,
    /// Window length in seconds.
    pub duration_secs: i32,
    /// Non-empty cells.
    pub cells: usize,
}

impl From<&PageRecord> for ListEntry {
    fn from(record: &PageRecord) -> Self {
        Self {
            id: record.id().value(),
            start: format_timestamp(record.timestamp()),
            end: format_timestamp(record.end()),
            duration_secs: record.duration_secs(),
            cells: record.non_empty_count(),
        }
    }
}

/// Run the list command.
pub async fn run(path: &Path, json: bool) -> Result<()> {
    let file = PageFile::load(path).await?;
    file.report_errors(path);
    let entries: Vec<ListEntry> = file.records.iter().map(ListEntry::from).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No pages in {}", path.display());
        return Ok(());
    }

    println!("{:>8}  {:<19}  {:<19}  {:>8}  {:>5}", "ID", "START", "END", "DURATION", "CELLS");
    for entry in &entries {
        println!(
            "{:>8}  {:<19}  {:<19}  {:>7}s  {:>5}",
            entry.id, entry.start, entry.end, entry.duration_secs, entry.cells
        );
    }
    Ok(())
}
