//! Compose a page and add it to the record file.

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, TimeDelta};
use pagecast_types::text::{format_timestamp, parse_timestamp};
use pagecast_types::{Color, Grid, PageRecord, RecordId};
use std::path::Path;

use crate::pages::{self, PageFile};

/// What the page should contain and when it airs.
#[derive(Debug, Clone)]
pub struct ComposeArgs {
    /// Record ID, unique within the file.
    pub id: i32,
    /// Window length in seconds.
    pub duration_secs: i32,
    /// Window start as `YYYY-MM-DD HH:MM:SS`.
    pub at: Option<String>,
    /// Window start as seconds from now.
    pub delay_secs: Option<i64>,
    /// Text color.
    pub fore: Color,
    /// Background color.
    pub back: Color,
    /// Page text; `\n` starts a new row.
    pub text: String,
}

/// Build the record described by `args`, timed relative to `now`.
pub fn build_record(args: &ComposeArgs, now: NaiveDateTime) -> Result<PageRecord> {
    let timestamp = match (&args.at, args.delay_secs) {
        (Some(at), _) => parse_timestamp(at).context("Invalid --at timestamp")?,
        (None, Some(delay)) => TimeDelta::try_seconds(delay)
            .and_then(|d| now.checked_add_signed(d))
            .context("Invalid --delay")?,
        (None, None) => now,
    };

    let mut grid = Grid::blank();
    let text = args.text.replace("\\n", "\n");
    grid.write_text(0, 0, &text, args.fore, args.back);

    Ok(PageRecord::new(
        RecordId::new(args.id),
        timestamp,
        args.duration_secs,
        grid,
    ))
}

/// Run the compose command.
pub async fn run(path: &Path, args: &ComposeArgs) -> Result<()> {
    let file = PageFile::load(path).await?;
    if file.find(RecordId::new(args.id)).is_some() {
        anyhow::bail!("A record with ID {} already exists in {}", args.id, path.display());
    }

    let record = build_record(args, chrono::Local::now().naive_local())?;
    pages::append(path, &record).await?;

    println!(
        "Added page {} ({} cells) airing {} for {}s",
        record.id(),
        record.non_empty_count(),
        format_timestamp(record.timestamp()),
        record.duration_secs()
    );
    Ok(())
}
