//! # pagecast
//!
//! Operator tool for composing Pagecast pages and sending them to a station.
//!
//! ## Commands
//!
//! - `compose`: Add a page to the record file
//! - `list`: List the pages in the record file
//! - `show`: Print one page
//! - `delete`: Remove a page from the record file
//! - `import`: Merge pages from another record file
//! - `send`: Transfer pages to a station
//!
//! ## Example
//!
//! ```bash
//! # Compose a page that airs in 30 seconds for two minutes
//! pagecast compose --id 100 --delay 30 --duration 120 --fore yellow "BREAKING\nNews at ten"
//!
//! # Review the record file
//! pagecast list
//! pagecast show --id 100
//! pagecast import backup.txt
//! pagecast delete --id 100
//!
//! # Send everything to a station
//! pagecast send --host 192.168.1.20 --port 1234
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use pagecast_types::{Color, DEFAULT_DURATION_SECS, DEFAULT_PORT};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod pages;

use commands::{compose, delete, import, list, send, show};

/// Compose Pagecast pages and send them to a station.
#[derive(Parser, Debug)]
#[command(name = "pagecast")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Record file (default: pages.txt in the data directory)
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a page to the record file
    Compose {
        /// Record ID
        #[arg(long)]
        id: i32,

        /// Seconds the page stays on air
        #[arg(long, default_value_t = DEFAULT_DURATION_SECS)]
        duration: i32,

        /// Air time as "YYYY-MM-DD HH:MM:SS"
        #[arg(long, conflicts_with = "delay")]
        at: Option<String>,

        /// Air time as seconds from now
        #[arg(long, allow_negative_numbers = true)]
        delay: Option<i64>,

        /// Text color (name or palette index)
        #[arg(long, default_value = "white")]
        fore: Color,

        /// Background color (name or palette index)
        #[arg(long, default_value = "black")]
        back: Color,

        /// Page text; "\n" starts a new row
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// List the pages in the record file
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print one page
    Show {
        /// Record ID
        #[arg(long)]
        id: i32,
    },

    /// Remove a page from the record file
    Delete {
        /// Record ID
        #[arg(long)]
        id: i32,
    },

    /// Merge pages from another record file, skipping IDs already in use
    Import {
        /// Record file to read
        source: PathBuf,
    },

    /// Transfer pages to a station
    Send {
        /// Station IP address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Station port
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Only send these record IDs (repeatable)
        #[arg(long = "id")]
        ids: Vec<i32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let path = match cli.file {
        Some(path) => path,
        None => pages::default_path()?,
    };

    match cli.command {
        Commands::Compose {
            id,
            duration,
            at,
            delay,
            fore,
            back,
            text,
        } => {
            let args = compose::ComposeArgs {
                id,
                duration_secs: duration,
                at,
                delay_secs: delay,
                fore,
                back,
                text: text.join(" "),
            };
            compose::run(&path, &args).await?;
        }
        Commands::List { json } => {
            list::run(&path, json).await?;
        }
        Commands::Show { id } => {
            show::run(&path, id).await?;
        }
        Commands::Delete { id } => {
            delete::run(&path, id).await?;
        }
        Commands::Import { source } => {
            import::run(&path, &source).await?;
        }
        Commands::Send { host, port, ids } => {
            send::run(&path, &host, port, &ids).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_compose() {
        let cli = Cli::try_parse_from([
            "pagecast", "--file", "p.txt", "compose", "--id", "7", "--delay", "-5", "--fore",
            "12", "hello", "world",
        ])
        .unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("p.txt")));
        match cli.command {
            Commands::Compose {
                id,
                delay,
                fore,
                back,
                duration,
                text,
                ..
            } => {
                assert_eq!(id, 7);
                assert_eq!(delay, Some(-5));
                assert_eq!(fore, Color::Red);
                assert_eq!(back, Color::Black);
                assert_eq!(duration, DEFAULT_DURATION_SECS);
                assert_eq!(text, vec!["hello", "world"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn at_and_delay_conflict() {
        let result = Cli::try_parse_from([
            "pagecast", "compose", "--id", "1", "--at", "2024-01-01 00:00:00", "--delay", "3",
            "x",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_send_with_ids() {
        let cli =
            Cli::try_parse_from(["pagecast", "send", "--id", "1", "--id", "4", "--port", "999"])
                .unwrap();
        match cli.command {
            Commands::Send { host, port, ids } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 999);
                assert_eq!(ids, vec![1, 4]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parses_delete_and_import() {
        let cli = Cli::try_parse_from(["pagecast", "delete", "--id", "12"]).unwrap();
        assert!(matches!(cli.command, Commands::Delete { id: 12 }));

        let cli = Cli::try_parse_from(["pagecast", "import", "old.txt"]).unwrap();
        match cli.command {
            Commands::Import { source } => assert_eq!(source, PathBuf::from("old.txt")),
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(Cli::try_parse_from(["pagecast", "import"]).is_err());
    }
}
