//! In-memory record store shared by sessions and the scheduler.
//!
//! Records are kept in arrival order behind a single async mutex. A record
//! is inserted only once all of its cells have been applied, and nothing
//! awaits I/O while the lock is held.

use std::sync::Arc;

use pagecast_core::{BatchAdmission, Verdict};
use pagecast_types::{PageRecord, RecordId};
use tokio::sync::Mutex;

/// Shared, ordered collection of accepted records.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Arc<Mutex<Vec<Arc<PageRecord>>>>,
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide on `record` within `batch` and insert it if accepted.
    ///
    /// The stored-ID check and the insertion happen under one lock, so two
    /// sessions can never both accept the same ID.
    pub async fn admit(
        &self,
        batch: &mut BatchAdmission,
        record: PageRecord,
    ) -> (Verdict, Option<Arc<PageRecord>>) {
        let mut records = self.records.lock().await;
        let id_stored = records.iter().any(|r| r.id() == record.id());
        let verdict = batch.admit(&record, id_stored);
        if verdict.is_accept() {
            let record = Arc::new(record);
            records.push(Arc::clone(&record));
            (verdict, Some(record))
        } else {
            (verdict, None)
        }
    }

    /// Run `f` with exclusive access to the records.
    pub async fn with_records<R>(&self, f: impl FnOnce(&mut Vec<Arc<PageRecord>>) -> R) -> R {
        let mut records = self.records.lock().await;
        f(&mut records)
    }

    /// Current records in arrival order.
    pub async fn snapshot(&self) -> Vec<Arc<PageRecord>> {
        self.records.lock().await.clone()
    }

    /// Record with the given ID.
    pub async fn get(&self, id: RecordId) -> Option<Arc<PageRecord>> {
        self.records
            .lock()
            .await
            .iter()
            .find(|r| r.id() == id)
            .cloned()
    }

    /// Whether a record with the given ID is stored.
    pub async fn contains(&self, id: RecordId) -> bool {
        self.records.lock().await.iter().any(|r| r.id() == id)
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}
