//! Send records from the record file to a station.

use anyhow::{Context, Result};
use pagecast_client::{
    is_valid_address, RecordSender, SenderConfig, TcpTransport, TransferEvent, TransferSummary,
    Transport,
};
use pagecast_types::{PageRecord, RecordId};
use std::path::Path;
use tokio::sync::mpsc;

use crate::pages::PageFile;

/// Records to send: all of them, or those with the given IDs in file order.
pub fn select(records: &[PageRecord], ids: &[i32]) -> Result<Vec<PageRecord>> {
    if ids.is_empty() {
        return Ok(records.to_vec());
    }
    for id in ids {
        if !records.iter().any(|r| r.id() == RecordId::new(*id)) {
            anyhow::bail!("No record with ID {} in the record file", id);
        }
    }
    Ok(records
        .iter()
        .filter(|r| ids.contains(&r.id().value()))
        .cloned()
        .collect())
}

/// Human-readable line for a transfer event.
pub fn describe(event: &TransferEvent) -> String {
    match event {
        TransferEvent::Accepted(record) => format!("  page {}: accepted", record.id()),
        TransferEvent::RejectedDuplicateId(record) => {
            format!("  page {}: rejected (ID already on the station)", record.id())
        }
        TransferEvent::RejectedDuplicateTimestamp(record) => format!(
            "  page {}: rejected (another page in this batch starts at the same time)",
            record.id()
        ),
        TransferEvent::Finished(summary) => format!(
            "Done: {} accepted, {} rejected, {} unconfirmed",
            summary.accepted, summary.rejected, summary.unconfirmed
        ),
    }
}

/// Run the send command.
pub async fn run(path: &Path, host: &str, port: u16, ids: &[i32]) -> Result<()> {
    if !is_valid_address(host) {
        anyhow::bail!("Invalid station address: {}", host);
    }

    let file = PageFile::load(path).await?;
    file.report_errors(path);
    let records = select(&file.records, ids)?;
    if records.is_empty() {
        println!("Nothing to send.");
        return Ok(());
    }

    let config = SenderConfig::for_station(host.trim(), port);
    println!("Sending {} pages to {}...", records.len(), config.address);
    transfer(config, TcpTransport::new(), &records).await?;
    Ok(())
}

/// Connect, transfer and print every outcome as it arrives.
pub async fn transfer<T: Transport>(
    config: SenderConfig,
    transport: T,
    records: &[PageRecord],
) -> Result<TransferSummary> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            println!("{}", describe(&event));
        }
    });

    let sender = RecordSender::new(config, transport).with_events(tx);
    sender
        .connect()
        .await
        .context("Failed to connect to station")?;
    let summary = sender.transfer(records).await.context("Transfer failed")?;
    sender.disconnect().await.context("Failed to disconnect")?;

    drop(sender);
    printer.await.context("Event printer failed")?;
    Ok(summary)
}
