//! Merge records from another file into the record file.

use anyhow::{Context, Result};
use pagecast_types::{PageRecord, RecordId};
use std::collections::HashSet;
use std::path::Path;

use crate::pages::{self, PageFile};

/// Split of the incoming records.
#[derive(Debug, Default)]
pub struct Merge {
    /// Records with new IDs, in source order.
    pub added: Vec<PageRecord>,
    /// IDs refused because they already exist or repeat in the source.
    pub skipped: Vec<RecordId>,
}

/// Decide which `incoming` records can join `existing`.
pub fn merge(existing: &[PageRecord], incoming: Vec<PageRecord>) -> Merge {
    let mut taken: HashSet<RecordId> = existing.iter().map(PageRecord::id).collect();
    let mut merge = Merge::default();
    for record in incoming {
        if taken.insert(record.id()) {
            merge.added.push(record);
        } else {
            merge.skipped.push(record.id());
        }
    }
    merge
}

/// Run the import command.
pub async fn run(path: &Path, source: &Path) -> Result<()> {
    tokio::fs::metadata(source)
        .await
        .with_context(|| format!("Failed to read {}", source.display()))?;
    let incoming = PageFile::load(source).await?;
    incoming.report_errors(source);

    let file = PageFile::load(path).await?;
    let merge = merge(&file.records, incoming.records);
    for id in &merge.skipped {
        eprintln!("warning: skipped page {}: ID already in use", id);
    }
    for record in &merge.added {
        pages::append(path, record).await?;
    }

    println!(
        "Imported {} pages from {} ({} skipped, {} malformed)",
        merge.added.len(),
        source.display(),
        merge.skipped.len(),
        incoming.errors.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pagecast_types::text::export_records;
    use tempfile::tempdir;

    fn record(id: i32, duration: i32) -> PageRecord {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        PageRecord::blank(RecordId::new(id), ts, duration)
    }

    #[test]
    fn merge_refuses_taken_and_repeated_ids() {
        let existing = vec![record(1, 10), record(2, 10)];
        let incoming = vec![record(2, 99), record(3, 10), record(3, 99), record(4, 10)];

        let merge = merge(&existing, incoming);
        let added: Vec<i32> = merge.added.iter().map(|r| r.id().value()).collect();
        assert_eq!(added, vec![3, 4]);
        assert_eq!(merge.added[0].duration_secs(), 10);
        assert_eq!(merge.skipped, vec![RecordId::new(2), RecordId::new(3)]);
    }

    #[tokio::test]
    async fn import_appends_new_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pages.txt");
        let source = dir.path().join("other.txt");
        pages::append(&path, &record(1, 10)).await.unwrap();
        let contents = format!(
            "{}not a record\n",
            export_records(&[record(1, 99), record(5, 10)])
        );
        tokio::fs::write(&source, contents).await.unwrap();

        run(&path, &source).await.unwrap();

        let file = PageFile::load(&path).await.unwrap();
        assert!(file.errors.is_empty());
        let ids: Vec<i32> = file.records.iter().map(|r| r.id().value()).collect();
        assert_eq!(ids, vec![1, 5]);
        assert_eq!(file.find(RecordId::new(1)).unwrap().duration_secs(), 10);
    }

    #[tokio::test]
    async fn missing_source_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pages.txt");
        assert!(run(&path, &dir.path().join("nope.txt")).await.is_err());
        assert!(!path.exists());
    }
}
