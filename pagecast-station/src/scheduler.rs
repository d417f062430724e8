//! Background on-air scheduling.
//!
//! Periodically picks the record to put on air and evicts records whose
//! window has ended.

use crate::server::{Station, StationEvent};
use chrono::NaiveDateTime;
use pagecast_core::{OnAir, ScheduleAction, Window};
use pagecast_types::RecordId;
use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Drives the on-air selection for one station.
#[derive(Debug)]
pub struct Scheduler {
    station: Arc<Station>,
    on_air: OnAir,
}

impl Scheduler {
    /// Create a scheduler with nothing on air.
    pub fn new(station: Arc<Station>) -> Self {
        Self {
            station,
            on_air: OnAir::Idle,
        }
    }

    /// Record currently on air.
    pub fn on_air(&self) -> Option<RecordId> {
        self.on_air.selected()
    }

    /// Run one tick at `now`. Returns the actions taken.
    pub async fn tick_at(&mut self, now: NaiveDateTime) -> Vec<ScheduleAction> {
        if !self.station.is_rendering() {
            let (next, actions) = self.on_air.on_disabled();
            self.on_air = next;
            for action in &actions {
                if matches!(action, ScheduleAction::Clear) {
                    tracing::debug!("Rendering disabled, clearing display");
                    self.station.publish(StationEvent::OnAir(None));
                }
            }
            return actions;
        }

        let on_air = self.on_air;
        let (next, actions, events) = self
            .station
            .store()
            .with_records(|records| {
                let windows: Vec<Window> = records.iter().map(|r| Window::of(r)).collect();
                let (next, actions) = on_air.on_tick(now, &windows);

                let mut events = Vec::new();
                let mut evicted = HashSet::new();
                for action in &actions {
                    match action {
                        ScheduleAction::Clear => events.push(StationEvent::OnAir(None)),
                        ScheduleAction::Show { id } => {
                            let record = records.iter().find(|r| r.id() == *id).cloned();
                            events.push(StationEvent::OnAir(record));
                        }
                        ScheduleAction::Evict { id } => {
                            evicted.insert(*id);
                        }
                    }
                }
                records.retain(|r| !evicted.contains(&r.id()));
                (next, actions, events)
            })
            .await;
        self.on_air = next;

        for action in &actions {
            match action {
                ScheduleAction::Evict { id } => {
                    self.station
                        .metrics()
                        .records_expired
                        .fetch_add(1, Ordering::Relaxed);
                    tracing::debug!("Evicted expired record {}", id);
                }
                ScheduleAction::Show { id } => tracing::info!("Record {} on air", id),
                ScheduleAction::Clear => tracing::debug!("Display cleared"),
            }
        }
        for event in events {
            self.station.publish(event);
        }
        actions
    }
}

/// Spawn the periodic scheduling task.
///
/// Ticks every `interval` against the local wall clock. Returns a handle
/// that can be used to abort the task.
pub fn spawn_scheduler(station: Arc<Station>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        let mut scheduler = Scheduler::new(station);

        tracing::info!("Scheduler started (interval: {:?})", interval);

        loop {
            ticker.tick().await;
            let now = chrono::Local::now().naive_local();
            scheduler.tick_at(now).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::{NaiveDate, TimeDelta};
    use pagecast_core::BatchAdmission;
    use pagecast_types::PageRecord;
    use tokio::sync::broadcast;

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn at(secs: i64) -> NaiveDateTime {
        base() + TimeDelta::seconds(secs)
    }

    async fn station_with(records: &[(i32, i64, i32)]) -> Arc<Station> {
        let station = Arc::new(Station::new(Config::default()));
        for &(id, start, duration) in records {
            let record = PageRecord::blank(RecordId::new(id), at(start), duration);
            station
                .store()
                .admit(&mut BatchAdmission::new(), record)
                .await;
        }
        station
    }

    fn on_air_events(rx: &mut broadcast::Receiver<StationEvent>) -> Vec<Option<RecordId>> {
        let mut shown = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let StationEvent::OnAir(record) = event {
                shown.push(record.map(|r| r.id()));
            }
        }
        shown
    }

    #[tokio::test]
    async fn shows_the_active_record() {
        let station = station_with(&[(1, 0, 60)]).await;
        let mut rx = station.subscribe();
        let mut scheduler = Scheduler::new(Arc::clone(&station));

        scheduler.tick_at(at(-5)).await;
        assert_eq!(scheduler.on_air(), None);

        scheduler.tick_at(at(10)).await;
        assert_eq!(scheduler.on_air(), Some(RecordId::new(1)));
        assert_eq!(on_air_events(&mut rx), vec![Some(RecordId::new(1))]);

        // Steady state emits nothing.
        scheduler.tick_at(at(11)).await;
        assert!(on_air_events(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn newer_record_wins() {
        let station = station_with(&[(1, 0, 120), (2, 30, 120)]).await;
        let mut rx = station.subscribe();
        let mut scheduler = Scheduler::new(Arc::clone(&station));

        scheduler.tick_at(at(10)).await;
        assert_eq!(scheduler.on_air(), Some(RecordId::new(1)));

        scheduler.tick_at(at(40)).await;
        assert_eq!(scheduler.on_air(), Some(RecordId::new(2)));
        assert_eq!(
            on_air_events(&mut rx),
            vec![Some(RecordId::new(1)), None, Some(RecordId::new(2))]
        );
    }

    #[tokio::test]
    async fn expired_records_are_evicted() {
        let station = station_with(&[(1, 0, 10), (2, 100, 10)]).await;
        let mut rx = station.subscribe();
        let mut scheduler = Scheduler::new(Arc::clone(&station));

        scheduler.tick_at(at(5)).await;
        assert_eq!(scheduler.on_air(), Some(RecordId::new(1)));

        // Exactly at the end the record is still on air.
        scheduler.tick_at(at(10)).await;
        assert!(station.store().contains(RecordId::new(1)).await);

        let actions = scheduler.tick_at(at(11)).await;
        assert!(actions.contains(&ScheduleAction::Evict { id: RecordId::new(1) }));
        assert_eq!(scheduler.on_air(), None);
        assert!(!station.store().contains(RecordId::new(1)).await);
        assert!(station.store().contains(RecordId::new(2)).await);
        assert_eq!(station.metrics().snapshot().records_expired, 1);
        assert_eq!(on_air_events(&mut rx), vec![Some(RecordId::new(1)), None]);
    }

    #[tokio::test]
    async fn disabled_rendering_clears_selection() {
        let station = station_with(&[(1, 0, 60)]).await;
        let mut rx = station.subscribe();
        let mut scheduler = Scheduler::new(Arc::clone(&station));

        scheduler.tick_at(at(1)).await;
        station.set_rendering(false);
        let actions = scheduler.tick_at(at(2)).await;

        assert_eq!(actions, vec![ScheduleAction::Clear]);
        assert_eq!(scheduler.on_air(), None);
        assert_eq!(on_air_events(&mut rx), vec![Some(RecordId::new(1)), None]);

        // Nothing is evicted while disabled.
        scheduler.tick_at(at(500)).await;
        assert!(station.store().contains(RecordId::new(1)).await);

        station.set_rendering(true);
        scheduler.tick_at(at(500)).await;
        assert!(station.store().is_empty().await);
    }

    #[tokio::test]
    async fn at_most_one_record_is_on_air() {
        let station = station_with(&[(1, 0, 50), (2, 10, 20), (3, 20, 100), (4, 20, 5)]).await;
        let mut scheduler = Scheduler::new(Arc::clone(&station));

        for secs in 0..150 {
            let now = at(secs);
            scheduler.tick_at(now).await;
            if let Some(id) = scheduler.on_air() {
                let record = station.store().get(id).await.unwrap();
                assert!(record.is_active_at(now));
            }
        }
        assert!(station.store().is_empty().await);
    }

    #[tokio::test]
    async fn spawned_scheduler_can_be_aborted() {
        let station = Arc::new(Station::new(Config::default()));
        let handle = spawn_scheduler(station, Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }
}
