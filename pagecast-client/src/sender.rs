//! RecordSender - ships page records to a station.
//!
//! # Architecture
//!
//! A transfer runs over one connection, strictly in order:
//!
//! ```text
//! announce(count) → page header + cell deltas, per record → collect acks
//! ```
//!
//! The acknowledgment bookkeeping is the pure [`AckTracker`] from
//! pagecast-core; this module does the polling and reading and feeds the
//! results in.
//!
//! # Example
//!
//! ```ignore
//! use pagecast_client::{RecordSender, SenderConfig, TcpTransport};
//!
//! let config = SenderConfig::for_station("192.168.1.10", 1234);
//! let sender = RecordSender::new(config, TcpTransport::new());
//!
//! sender.connect().await?;
//! let summary = sender.transfer(&records).await?;
//! sender.disconnect().await?;
//! ```

use std::net::IpAddr;
use std::time::Duration;

use pagecast_core::{AckEvent, AckOutcome, AckTracker, TransferSummary, DEFAULT_ACK_ATTEMPTS};
use pagecast_types::wire::{encode_page, Announcement, TAG_LEN};
use pagecast_types::{MessageType, PageRecord, Response, DEFAULT_PORT};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::transport::{Transport, TransportError};

/// Default time allowed for establishing a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Not connected to a station.
    #[error("not connected")]
    NotConnected,

    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Batch does not fit in one announcement.
    #[error("cannot announce {0} records (at most {max})", max = u16::MAX)]
    TooManyRecords(usize),
}

/// Whether `s` is an IPv4 or IPv6 address.
pub fn is_valid_address(s: &str) -> bool {
    s.trim().parse::<IpAddr>().is_ok()
}

/// Whether `s` is a port number in `0..=65535`.
pub fn is_valid_port(s: &str) -> bool {
    s.trim().parse::<u16>().is_ok()
}

/// Configuration for RecordSender.
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Station address as `host:port`.
    pub address: String,
    /// Empty polling rounds tolerated while waiting for acknowledgments.
    pub ack_attempts: u32,
    /// How long one polling round waits for data.
    pub poll_interval: Duration,
    /// Time allowed for establishing the connection.
    pub connect_timeout: Duration,
}

impl SenderConfig {
    /// Configuration for the station at `address` (`host:port`).
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            ack_attempts: DEFAULT_ACK_ATTEMPTS,
            poll_interval: Duration::from_secs(1),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Configuration for the station at `host` and `port`.
    pub fn for_station(host: &str, port: u16) -> Self {
        let host = host.trim();
        match host.parse::<IpAddr>() {
            Ok(IpAddr::V6(v6)) => Self::new(&format!("[{v6}]:{port}")),
            _ => Self::new(&format!("{host}:{port}")),
        }
    }

    /// Set the acknowledgment attempt budget.
    pub fn with_ack_attempts(mut self, attempts: u32) -> Self {
        self.ack_attempts = attempts;
        self
    }

    /// Set the wait per polling round.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self::for_station("127.0.0.1", DEFAULT_PORT)
    }
}

/// Progress notifications emitted during a transfer.
#[derive(Debug, Clone)]
pub enum TransferEvent {
    /// The station stored the record.
    Accepted(PageRecord),
    /// The station already holds a record with this ID.
    RejectedDuplicateId(PageRecord),
    /// The batch already contained a record with this timestamp.
    RejectedDuplicateTimestamp(PageRecord),
    /// The transfer is over.
    Finished(TransferSummary),
}

fn announced_count(len: usize) -> Result<u16, ClientError> {
    u16::try_from(len).map_err(|_| ClientError::TooManyRecords(len))
}

/// Sends record batches to a station over a [`Transport`].
pub struct RecordSender<T: Transport> {
    config: SenderConfig,
    transport: T,
    events: Option<mpsc::UnboundedSender<TransferEvent>>,
}

impl<T: Transport> RecordSender<T> {
    /// Create a new RecordSender.
    pub fn new(config: SenderConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            events: None,
        }
    }

    /// Deliver [`TransferEvent`]s to `events` as they happen.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<TransferEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Connect to the configured station. Failure is returned, never retried.
    pub async fn connect(&self) -> Result<(), ClientError> {
        let connect = self.transport.connect(&self.config.address);
        tokio::time::timeout(self.config.connect_timeout, connect)
            .await
            .map_err(|_| {
                ClientError::ConnectionFailed(format!(
                    "{}: timed out after {:?}",
                    self.config.address, self.config.connect_timeout
                ))
            })?
            .map_err(|e| ClientError::ConnectionFailed(e.to_string()))?;
        tracing::info!("Connected to station at {}", self.config.address);
        Ok(())
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Close the connection.
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        self.transport.close().await?;
        Ok(())
    }

    /// Get the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `records` as one batch and collect the station's answers.
    ///
    /// Write failures abort the transfer. Records without an answer when
    /// the attempt budget runs out, or when the station hangs up, count as
    /// unconfirmed.
    pub async fn transfer(&self, records: &[PageRecord]) -> Result<TransferSummary, ClientError> {
        let record_count = announced_count(records.len())?;
        if !self.transport.is_connected() {
            return Err(ClientError::NotConnected);
        }

        self.transport
            .send(&Announcement { record_count }.encode())
            .await?;
        for record in records {
            self.transport.send(&encode_page(record)).await?;
            tracing::debug!(
                "Sent record {} ({} cells)",
                record.id(),
                record.non_empty_count()
            );
        }

        let mut tracker = AckTracker::with_attempts(
            records.iter().map(PageRecord::id),
            self.config.ack_attempts,
        );
        while !tracker.is_done() {
            let event = self.next_ack_event().await?;
            match tracker.on_event(event) {
                Some(outcome) => self.emit_outcome(outcome, records),
                None => {
                    if let AckEvent::Response(response) = event {
                        tracing::warn!("Ignoring acknowledgment for unknown record {}", response.id());
                    }
                }
            }
        }

        if tracker.peer_closed() {
            tracing::warn!("Station closed the connection during acknowledgment wait");
        }
        let summary = tracker.summary();
        tracing::info!(
            "Transfer finished: {} accepted, {} rejected, {} unconfirmed",
            summary.accepted,
            summary.rejected,
            summary.unconfirmed
        );
        self.emit(TransferEvent::Finished(summary));
        Ok(summary)
    }

    /// One polling round of the acknowledgment wait.
    async fn next_ack_event(&self) -> Result<AckEvent, ClientError> {
        match self.transport.poll_readable(self.config.poll_interval).await {
            Ok(true) => {}
            Ok(false) => return Ok(AckEvent::Idle),
            Err(e) => return peer_closed_or(e),
        }

        let tag = match self.transport.recv_exact(TAG_LEN).await {
            Ok(tag) => tag,
            Err(e) => return peer_closed_or(e),
        };
        let message_type = MessageType::from_tag(&tag);
        let payload_len = match message_type {
            MessageType::RecordTransferred | MessageType::RecordRejected => {
                message_type.payload_len()
            }
            _ => None,
        };
        let Some(payload_len) = payload_len else {
            tracing::warn!("Skipping unexpected tag {:?}", tag.first());
            return Ok(AckEvent::Void);
        };

        let payload = match self.transport.recv_exact(payload_len).await {
            Ok(payload) => payload,
            Err(e) => return peer_closed_or(e),
        };
        match Response::decode_payload(message_type, &payload) {
            Ok(response) => Ok(AckEvent::Response(response)),
            Err(e) => {
                tracing::warn!("Discarding malformed acknowledgment: {}", e);
                Ok(AckEvent::Void)
            }
        }
    }

    fn emit_outcome(&self, outcome: AckOutcome, records: &[PageRecord]) {
        let record = records[outcome.index()].clone();
        let event = match outcome {
            AckOutcome::Accepted { id, .. } => {
                tracing::debug!("Record {} accepted", id);
                TransferEvent::Accepted(record)
            }
            AckOutcome::RejectedDuplicateId { id, .. } => {
                tracing::debug!("Record {} rejected: duplicate id", id);
                TransferEvent::RejectedDuplicateId(record)
            }
            AckOutcome::RejectedDuplicateTimestamp { id, .. } => {
                tracing::debug!("Record {} rejected: duplicate timestamp", id);
                TransferEvent::RejectedDuplicateTimestamp(record)
            }
        };
        self.emit(event);
    }

    fn emit(&self, event: TransferEvent) {
        if let Some(events) = &self.events {
            // The caller may have stopped listening.
            events.send(event).ok();
        }
    }
}

/// A closed or truncated stream ends the wait; anything else is fatal.
fn peer_closed_or(error: TransportError) -> Result<AckEvent, ClientError> {
    match error {
        TransportError::ConnectionClosed | TransportError::StreamEnded { .. } => {
            Ok(AckEvent::PeerClosed)
        }
        other => Err(other.into()),
    }
}
