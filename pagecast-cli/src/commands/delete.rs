//! Remove a record from the record file.

use anyhow::Result;
use pagecast_types::RecordId;
use std::path::Path;

use crate::pages::{self, PageFile};

/// Run the delete command.
///
/// Refuses to rewrite a file that has malformed lines, since they would be
/// dropped.
pub async fn run(path: &Path, id: i32) -> Result<()> {
    let mut file = PageFile::load(path).await?;
    if !file.errors.is_empty() {
        file.report_errors(path);
        anyhow::bail!(
            "{} has {} malformed lines; fix them before deleting",
            path.display(),
            file.errors.len()
        );
    }

    let id = RecordId::new(id);
    let before = file.records.len();
    file.records.retain(|record| record.id() != id);
    if file.records.len() == before {
        anyhow::bail!("No record with ID {} in {}", id, path.display());
    }

    pages::write_all(path, &file.records).await?;
    println!("Deleted page {} ({} left)", id, file.records.len());
    Ok(())
}
