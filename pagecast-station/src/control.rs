//! Operator commands read line by line while the station runs.
//!
//! | Line | Effect |
//! |------|--------|
//! | `r`, `render` | toggle on-air rendering |
//! | `on` / `off` | switch rendering on or off |
//! | `status` | log counters and stored record IDs |

use crate::server::Station;
use std::io::BufRead;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A parsed operator command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Flip the rendering switch.
    ToggleRendering,
    /// Force rendering on or off.
    SetRendering(bool),
    /// Report counters.
    Status,
}

impl Command {
    /// Parse one input line; blank or unknown lines give `None`.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "r" | "render" => Some(Command::ToggleRendering),
            "on" => Some(Command::SetRendering(true)),
            "off" => Some(Command::SetRendering(false)),
            "status" => Some(Command::Status),
            _ => None,
        }
    }
}

/// Apply `command` to the station.
pub async fn apply(station: &Station, command: Command) {
    match command {
        Command::ToggleRendering => station.set_rendering(!station.is_rendering()),
        Command::SetRendering(enabled) => station.set_rendering(enabled),
        Command::Status => {
            let metrics = station.metrics().snapshot();
            let stored: Vec<String> = station
                .store()
                .snapshot()
                .await
                .iter()
                .map(|record| record.id().to_string())
                .collect();
            tracing::info!(
                "Rendering {}, {} records stored [{}]; {} connections, {} accepted, {} rejected, {} expired",
                if station.is_rendering() { "on" } else { "off" },
                stored.len(),
                stored.join(", "),
                metrics.connections_total,
                metrics.records_accepted,
                metrics.records_rejected,
                metrics.records_expired
            );
        }
    }
}

/// Forward stdin lines from a dedicated thread.
///
/// The thread blocks on stdin and ends with it; it never keeps the process
/// alive after `main` returns.
pub fn stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Apply commands from `lines` until the channel closes.
pub async fn run(station: Arc<Station>, mut lines: mpsc::Receiver<String>) {
    while let Some(line) = lines.recv().await {
        match Command::parse(&line) {
            Some(command) => apply(&station, command).await,
            None if line.trim().is_empty() => {}
            None => tracing::warn!("Unknown command {:?} (try r, on, off, status)", line.trim()),
        }
    }
    tracing::debug!("Operator input closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    async fn feed(station: &Arc<Station>, input: &[&str]) {
        let (tx, rx) = mpsc::channel(input.len().max(1));
        for line in input {
            tx.send(line.to_string()).await.unwrap();
        }
        drop(tx);
        run(Arc::clone(station), rx).await;
    }

    #[test]
    fn parse_commands() {
        assert_eq!(Command::parse("r"), Some(Command::ToggleRendering));
        assert_eq!(Command::parse(" Render \r"), Some(Command::ToggleRendering));
        assert_eq!(Command::parse("off"), Some(Command::SetRendering(false)));
        assert_eq!(Command::parse("ON"), Some(Command::SetRendering(true)));
        assert_eq!(Command::parse("status"), Some(Command::Status));
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("quit"), None);
    }

    #[tokio::test]
    async fn toggle_flips_rendering() {
        let station = Arc::new(Station::new(Config::default()));
        assert!(station.is_rendering());

        feed(&station, &["r"]).await;
        assert!(!station.is_rendering());

        feed(&station, &["r", "bogus", "", "r", "r"]).await;
        assert!(!station.is_rendering());
    }

    #[tokio::test]
    async fn explicit_switch_and_status() {
        let station = Arc::new(Station::new(Config::default()));
        feed(&station, &["off", "status", "off"]).await;
        assert!(!station.is_rendering());

        feed(&station, &["on"]).await;
        assert!(station.is_rendering());
    }
}
