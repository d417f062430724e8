//! The local record file.
//!
//! One record per line in the `id;timestamp;duration;cells` text form.

use anyhow::{Context, Result};
use pagecast_types::text::{export_record, export_records, parse_records, LineError};
use pagecast_types::{PageRecord, RecordId};
use std::path::{Path, PathBuf};

/// File name used inside the data directory.
pub const DEFAULT_FILE_NAME: &str = "pages.txt";

/// Records read from a file, plus the lines that did not parse.
#[derive(Debug, Default)]
pub struct PageFile {
    /// Well-formed records in file order.
    pub records: Vec<PageRecord>,
    /// Malformed lines.
    pub errors: Vec<LineError>,
}

impl PageFile {
    /// Load a record file. A missing file holds no records.
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };
        let (records, errors) = parse_records(&contents);
        Ok(Self { records, errors })
    }

    /// Record with the given ID.
    pub fn find(&self, id: RecordId) -> Option<&PageRecord> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Print a warning for every malformed line.
    pub fn report_errors(&self, path: &Path) {
        for error in &self.errors {
            eprintln!(
                "warning: {}:{}: skipped: {}",
                path.display(),
                error.line,
                error.error
            );
        }
    }
}

/// Append one record line, creating the file and its directory if needed.
pub async fn append(path: &Path, record: &PageRecord) -> Result<()> {
    use tokio::io::AsyncWriteExt;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .context("Failed to create data directory")?;
    }

    let existing = match tokio::fs::read(path).await {
        Ok(existing) => existing,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };
    let mut line = String::new();
    if existing.last().is_some_and(|b| *b != b'\n') {
        line.push('\n');
    }
    line.push_str(&export_record(record));
    line.push('\n');

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;
    file.write_all(line.as_bytes())
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Replace the file contents with `records`.
pub async fn write_all(path: &Path, records: &[PageRecord]) -> Result<()> {
    tokio::fs::write(path, export_records(records))
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Default record file inside the platform data directory.
pub fn default_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "pagecast", "pagecast")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().join(DEFAULT_FILE_NAME))
}
