//! Main Station coordination.
//!
//! Station owns the record store, the rendering switch, the event channel
//! and the operational counters. Sessions and the scheduler share it
//! through an `Arc`.

use crate::config::Config;
use crate::store::RecordStore;
use pagecast_types::PageRecord;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the station event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Operational metrics for monitoring station activity.
///
/// All counters are monotonically increasing (reset only on restart).
#[derive(Debug, Default)]
pub struct StationMetrics {
    /// Total connections accepted.
    pub connections_total: AtomicU64,
    /// Total records accepted into the store.
    pub records_accepted: AtomicU64,
    /// Total records rejected as duplicates.
    pub records_rejected: AtomicU64,
    /// Total records evicted after their window ended.
    pub records_expired: AtomicU64,
}

impl StationMetrics {
    /// Plain-number copy of the counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            records_accepted: self.records_accepted.load(Ordering::Relaxed),
            records_rejected: self.records_rejected.load(Ordering::Relaxed),
            records_expired: self.records_expired.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`StationMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    /// Total connections accepted.
    pub connections_total: u64,
    /// Total records accepted into the store.
    pub records_accepted: u64,
    /// Total records rejected as duplicates.
    pub records_rejected: u64,
    /// Total records evicted after their window ended.
    pub records_expired: u64,
}

/// Notifications published by the station.
#[derive(Debug, Clone)]
pub enum StationEvent {
    /// A batch finished; these records were accepted.
    RecordsReceived(Vec<Arc<PageRecord>>),
    /// The on-air record changed; `None` blanks the display.
    OnAir(Option<Arc<PageRecord>>),
}

/// The receiving station.
#[derive(Debug)]
pub struct Station {
    config: Config,
    store: RecordStore,
    events: broadcast::Sender<StationEvent>,
    rendering: AtomicBool,
    metrics: StationMetrics,
}

impl Station {
    /// Create a new Station with the given config and an empty store.
    pub fn new(config: Config) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let rendering = AtomicBool::new(config.schedule.rendering);
        Self {
            config,
            store: RecordStore::new(),
            events,
            rendering,
            metrics: StationMetrics::default(),
        }
    }

    /// Get the station configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get access to the record store.
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Get access to the operational metrics.
    pub fn metrics(&self) -> &StationMetrics {
        &self.metrics
    }

    /// Receive station events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StationEvent> {
        self.events.subscribe()
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: StationEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Switch on-air rendering on or off; observed at the next tick.
    pub fn set_rendering(&self, enabled: bool) {
        self.rendering.store(enabled, Ordering::SeqCst);
        tracing::info!("Rendering {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Whether on-air rendering is enabled.
    pub fn is_rendering(&self) -> bool {
        self.rendering.load(Ordering::SeqCst)
    }

    /// Count an accepted connection.
    pub(crate) fn record_connection(&self) {
        self.metrics.connections_total.fetch_add(1, Ordering::Relaxed);
    }
}
