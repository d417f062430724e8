//! pagecast-station binary entry point.
//!
//! Usage:
//! ```bash
//! pagecast-station --config station.toml
//! pagecast-station --port 4000
//! ```
//!
//! While running, the station reads operator commands from stdin:
//! `r` toggles on-air rendering, `on`/`off` set it, `status` logs counters.

use anyhow::{Context, Result};
use clap::Parser;
use pagecast_station::{control, protocol, spawn_scheduler, Config, Station, StationEvent};
use pagecast_types::PageRecord;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

/// Receiving station for Pagecast pages.
#[derive(Parser, Debug)]
#[command(name = "pagecast-station")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file (used only if it exists, unless given explicitly)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen port, overriding the configured bind address' port
    #[arg(long)]
    port: Option<u16>,
}

const DEFAULT_CONFIG_PATH: &str = "station.toml";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = load_config(args.config)?;
    if let Some(port) = args.port {
        config = config.with_port(port).context("Invalid bind address")?;
    }

    let station = Arc::new(Station::new(config));
    let listener = protocol::bind(&station)
        .await
        .context("Failed to bind station listener")?;

    let scheduler = spawn_scheduler(
        Arc::clone(&station),
        station.config().schedule.tick_interval(),
    );
    let display = tokio::spawn(render_on_air(station.subscribe()));
    let operator = tokio::spawn(control::run(Arc::clone(&station), control::stdin_lines()));

    tokio::select! {
        _ = protocol::serve(Arc::clone(&station), listener) => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl-C")?;
            tracing::info!("Shutting down");
        }
    }

    scheduler.abort();
    display.abort();
    operator.abort();

    let metrics = station.metrics().snapshot();
    tracing::info!(
        "Served {} connections: {} accepted, {} rejected, {} expired",
        metrics.connections_total,
        metrics.records_accepted,
        metrics.records_rejected,
        metrics.records_expired
    );
    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(&path).context("Failed to load configuration"),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default.exists() {
                Config::from_file(&default).context("Failed to load configuration")
            } else {
                Ok(Config::default())
            }
        }
    }
}

/// Print every on-air change to the terminal.
async fn render_on_air(mut events: broadcast::Receiver<StationEvent>) {
    loop {
        match events.recv().await {
            Ok(StationEvent::OnAir(Some(record))) => print_record(&record),
            Ok(StationEvent::OnAir(None)) => println!("\n--- off air ---"),
            Ok(StationEvent::RecordsReceived(records)) => {
                tracing::debug!("{} records added to the store", records.len());
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Display lagged, skipped {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_record(record: &PageRecord) {
    println!(
        "\n=== page {} | {} .. {} | {}s ===",
        record.id(),
        pagecast_types::text::format_timestamp(record.timestamp()),
        pagecast_types::text::format_timestamp(record.end()),
        record.duration_secs()
    );
    for line in record.render_lines() {
        println!("{}", line);
    }
}
