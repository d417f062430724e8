//! Sender and station talking over a live TCP connection.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use pagecast_client::{RecordSender, SenderConfig, TcpTransport, TransferEvent, TransferSummary};
use pagecast_station::{protocol, spawn_scheduler, Config, Station, StationEvent};
use pagecast_types::{Color, PageRecord, RecordId};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

// ===== Helpers =====

fn ts(second: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 11, 2)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
        + TimeDelta::seconds(second)
}

fn page(id: i32, timestamp: NaiveDateTime, text: &str) -> PageRecord {
    let mut record = PageRecord::blank(RecordId::new(id), timestamp, 60);
    record
        .grid_mut()
        .write_text(2, 1, text, Color::White, Color::Red);
    record
}

async fn start_station() -> (Arc<Station>, SocketAddr) {
    let mut config = Config::default();
    config.server.bind_address = "127.0.0.1:0".into();
    let station = Arc::new(Station::new(config));
    let listener = protocol::bind(&station).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(protocol::serve(Arc::clone(&station), listener));
    (station, addr)
}

fn sender_for(addr: SocketAddr) -> RecordSender<TcpTransport> {
    let config = SenderConfig::new(&addr.to_string()).with_poll_interval(Duration::from_millis(50));
    RecordSender::new(config, TcpTransport::new())
}

async fn send(addr: SocketAddr, records: &[PageRecord]) -> TransferSummary {
    let sender = sender_for(addr);
    sender.connect().await.unwrap();
    let summary = sender.transfer(records).await.unwrap();
    sender.disconnect().await.unwrap();
    summary
}

// ===== Transfers =====

#[tokio::test]
async fn three_records_are_all_accepted() {
    let (station, addr) = start_station().await;
    let records = [
        page(1, ts(0), "first"),
        page(2, ts(1), "second"),
        page(3, ts(2), "third\nwith two rows"),
    ];

    let summary = send(addr, &records).await;

    assert_eq!(
        summary,
        TransferSummary {
            accepted: 3,
            rejected: 0,
            unconfirmed: 0
        }
    );
    assert_eq!(station.store().len().await, 3);
    let stored = station.store().get(RecordId::new(3)).await.unwrap();
    assert_eq!(stored.render_lines(), records[2].render_lines());
    assert_eq!(stored.timestamp(), ts(2));
}

#[tokio::test]
async fn events_report_each_outcome() {
    let (_station, addr) = start_station().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let sender = sender_for(addr).with_events(tx);
    sender.connect().await.unwrap();

    let records = [
        page(1, ts(0), "a"),
        page(1, ts(5), "same id"),
        page(2, ts(0), "same time"),
    ];
    let summary = sender.transfer(&records).await.unwrap();
    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.rejected, 2);

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert!(matches!(&events[0], TransferEvent::Accepted(r) if r.id() == RecordId::new(1)));
    assert!(matches!(&events[1], TransferEvent::RejectedDuplicateId(r) if r.timestamp() == ts(5)));
    assert!(
        matches!(&events[2], TransferEvent::RejectedDuplicateTimestamp(r) if r.id() == RecordId::new(2))
    );
    assert!(matches!(&events[3], TransferEvent::Finished(s) if *s == summary));
}

#[tokio::test]
async fn stored_id_is_rejected_in_a_new_connection() {
    let (station, addr) = start_station().await;
    send(addr, &[page(10, ts(0), "original")]).await;

    let summary = send(addr, &[page(10, ts(30), "replacement"), page(11, ts(0), "new")]).await;

    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.rejected, 1);
    let kept = station.store().get(RecordId::new(10)).await.unwrap();
    assert_eq!(kept.timestamp(), ts(0));
    // Timestamps are only compared within a batch.
    assert!(station.store().contains(RecordId::new(11)).await);
}

#[tokio::test]
async fn concurrent_senders_share_one_store() {
    let (station, addr) = start_station().await;
    let a = tokio::spawn(async move { send(addr, &[page(1, ts(0), "a"), page(2, ts(1), "a")]).await });
    let b = tokio::spawn(async move { send(addr, &[page(3, ts(0), "b"), page(4, ts(1), "b")]).await });

    assert_eq!(a.await.unwrap().accepted, 2);
    assert_eq!(b.await.unwrap().accepted, 2);
    assert_eq!(station.store().len().await, 4);
    assert_eq!(station.metrics().snapshot().records_accepted, 4);
}

#[tokio::test]
async fn refused_connection_is_reported() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let sender = sender_for(addr);
    assert!(sender.connect().await.is_err());
    assert!(!sender.is_connected());
}

// ===== On air =====

#[tokio::test]
async fn received_record_goes_on_air() {
    let mut config = Config::default();
    config.server.bind_address = "127.0.0.1:0".into();
    let station = Arc::new(Station::new(config));
    let listener = protocol::bind(&station).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(protocol::serve(Arc::clone(&station), listener));
    let mut rx = station.subscribe();
    let scheduler = spawn_scheduler(Arc::clone(&station), Duration::from_millis(10));

    let now = chrono::Local::now().naive_local();
    send(addr, &[page(42, now - TimeDelta::seconds(1), "live")]).await;

    let on_air = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(StationEvent::OnAir(Some(record))) = rx.recv().await {
                return record;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(on_air.id(), RecordId::new(42));
    scheduler.abort();
}
