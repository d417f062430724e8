//! Per-connection session management.
//!
//! Each connection gets a Session that reads batch announcements, decodes
//! the records that follow and answers every record before reading the
//! next one.

use crate::error::{ProtocolError, ProtocolResult};
use crate::server::{Station, StationEvent};
use pagecast_core::{BatchAdmission, Verdict};
use pagecast_types::wire::{
    Announcement, CellDelta, PageHeader, ANNOUNCEMENT_PAYLOAD_LEN, CELL_DELTA_LEN,
    PAGE_HEADER_LEN,
};
use pagecast_types::{MessageType, PageRecord, Response};
use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// A per-connection session.
pub struct Session<S> {
    station: Arc<Station>,
    stream: S,
    peer: String,
}

impl<S> fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("peer", &self.peer).finish()
    }
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Create a new session for a connection.
    pub fn new(station: Arc<Station>, stream: S, peer: impl Into<String>) -> Self {
        Self {
            station,
            stream,
            peer: peer.into(),
        }
    }

    /// Run the session until the peer closes the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream ends inside a batch, a record does not
    /// decode, or the connection fails.
    pub async fn run(mut self) -> ProtocolResult<()> {
        tracing::info!("Session opened for {}", self.peer);

        loop {
            let mut tag = [0u8; 1];
            if self.stream.read(&mut tag).await? == 0 {
                break;
            }

            match MessageType::from(tag[0]) {
                MessageType::TransferRecords => {
                    let payload = self.read_exact_bytes(ANNOUNCEMENT_PAYLOAD_LEN).await?;
                    let announcement = Announcement::decode_payload(&payload)?;
                    self.receive_batch(announcement.record_count).await?;
                }
                other => {
                    tracing::warn!(
                        "Skipping unexpected tag {} ({:?}) from {}",
                        tag[0],
                        other,
                        self.peer
                    );
                }
            }
        }

        tracing::info!("Session closed for {}", self.peer);
        Ok(())
    }

    /// Receive `count` records, answering each one as it is decided.
    async fn receive_batch(&mut self, count: u16) -> ProtocolResult<()> {
        tracing::debug!("Batch of {} records announced by {}", count, self.peer);

        let mut batch = BatchAdmission::new();
        let mut accepted = Vec::new();
        let mut rejected = 0usize;
        let mut result = Ok(());

        for _ in 0..count {
            match self.receive_one(&mut batch).await {
                Ok(Some(record)) => accepted.push(record),
                Ok(None) => rejected += 1,
                Err(e) => {
                    tracing::warn!(
                        "Batch from {} cut short after {} accepted: {}",
                        self.peer,
                        accepted.len(),
                        e
                    );
                    result = Err(e);
                    break;
                }
            }
        }

        tracing::info!(
            "Batch from {}: {} accepted, {} rejected",
            self.peer,
            accepted.len(),
            rejected
        );
        self.station.publish(StationEvent::RecordsReceived(accepted));
        result
    }

    /// Read, decide and answer one record. Returns the stored record when
    /// it was accepted.
    async fn receive_one(
        &mut self,
        batch: &mut BatchAdmission,
    ) -> ProtocolResult<Option<Arc<PageRecord>>> {
        let record = self.read_record().await?;
        let id = record.id();

        let (verdict, stored) = self.station.store().admit(batch, record).await;
        let metrics = self.station.metrics();
        let response = match verdict {
            Verdict::Accept => {
                metrics.records_accepted.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Accepted record {}", id);
                Response::Accepted { id }
            }
            Verdict::Reject(reason) => {
                metrics.records_rejected.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Rejected record {}: {:?}", id, reason);
                Response::Rejected { id, reason }
            }
        };

        self.stream.write_all(&response.encode()).await?;
        self.stream.flush().await?;
        Ok(stored)
    }

    /// Decode a header and apply exactly its announced cell deltas.
    async fn read_record(&mut self) -> ProtocolResult<PageRecord> {
        let header = PageHeader::decode(&self.read_exact_bytes(PAGE_HEADER_LEN).await?)?;
        let cell_count = header.cell_count;
        let mut record = header.into_blank_record();

        for _ in 0..cell_count {
            let delta = CellDelta::decode(&self.read_exact_bytes(CELL_DELTA_LEN).await?)?;
            delta.apply_to(&mut record)?;
        }
        Ok(record)
    }

    /// Read exactly `len` bytes, failing if the stream ends first.
    async fn read_exact_bytes(&mut self, len: usize) -> ProtocolResult<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            let n = self.stream.read(&mut buf[filled..]).await?;
            if n == 0 {
                return Err(ProtocolError::Truncated {
                    expected: len,
                    actual: filled,
                });
            }
            filled += n;
        }
        Ok(buf)
    }
}
