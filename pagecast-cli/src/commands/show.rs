//! Print one record's page.

use anyhow::Result;
use pagecast_types::text::format_timestamp;
use pagecast_types::{PageRecord, RecordId, COLUMNS};
use std::path::Path;

use crate::pages::PageFile;

/// Framed text rendering of a record.
pub fn render(record: &PageRecord) -> String {
    let border = format!("+{}+", "-".repeat(COLUMNS));
    let mut out = format!(
        "page {} | {} .. {} | {}s\n{}\n",
        record.id(),
        format_timestamp(record.timestamp()),
        format_timestamp(record.end()),
        record.duration_secs(),
        border
    );
    for row in record.grid().rows() {
        let line: String = row.iter().map(|cell| cell.sign()).collect();
        out.push('|');
        out.push_str(&line);
        out.push_str("|\n");
    }
    out.push_str(&border);
    out
}

/// Run the show command.
pub async fn run(path: &Path, id: i32) -> Result<()> {
    let file = PageFile::load(path).await?;
    let record = file
        .find(RecordId::new(id))
        .ok_or_else(|| anyhow::anyhow!("No record with ID {} in {}", id, path.display()))?;
    println!("{}", render(record));
    Ok(())
}
