//! `freebusy` CLI — reconcile free/busy snapshots with appointment records.
//!
//! ## Usage
//!
//! ```sh
//! # Reconcile every directory user over one working day
//! freebusy reconcile -i snapshot.json --start 2026-03-02T09:00:00 --end 2026-03-02T17:00:00
//!
//! # Only some users, wall-clock window in a named timezone, output to file
//! freebusy reconcile -i snapshot.json --email alice@example.com --email bob@example.com \
//!     --start 2026-03-02T09:00:00 --end 2026-03-02T17:00:00 --timezone Europe/Zurich -o out.json
//!
//! # List the users the directory resolves
//! freebusy users -i snapshot.json
//! ```
//!
//! Logs go to stderr; set `RUST_LOG` or pass `--verbose` for more detail.

mod report;
mod snapshot;

use std::io::{self, Read};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use freebusy_engine::{BridgeConfig, CalendarBridge, TimeRange};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::snapshot::Snapshot;

#[derive(Parser)]
#[command(
    name = "freebusy",
    version,
    about = "Reconcile free/busy data with appointments"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge free/busy ranges and appointments for directory users
    Reconcile {
        /// Snapshot file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Window start (RFC 3339 or local YYYY-MM-DDTHH:MM:SS)
        #[arg(long)]
        start: String,
        /// Window end (RFC 3339 or local YYYY-MM-DDTHH:MM:SS)
        #[arg(long)]
        end: String,
        /// IANA timezone for local window bounds
        #[arg(long, default_value = "UTC")]
        timezone: String,
        /// Only reconcile these users (repeatable); all users when omitted
        #[arg(long)]
        email: Vec<String>,
        /// Maximum concurrent appointment lookups (overrides the snapshot config)
        #[arg(long)]
        max_parallel_fetches: Option<usize>,
    },
    /// List the users the directory resolves
    Users {
        /// Snapshot file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Reconcile {
            input,
            output,
            start,
            end,
            timezone,
            email,
            max_parallel_fetches,
        } => {
            let window = TimeRange::from_local(&start, &end, &timezone)
                .context("Invalid reconciliation window")?;
            let snapshot = Snapshot::parse(&read_input(input.as_deref())?)?;

            let mut config = snapshot.config.clone().unwrap_or_default();
            if let Some(n) = max_parallel_fetches {
                config.max_parallel_fetches = n;
            }
            let bridge = build_bridge(snapshot, config);

            let users = if email.is_empty() {
                let mut users = bridge.retrieve_all_users().await?;
                bridge
                    .reconcile_batch(&mut users, &window)
                    .await
                    .context("Reconciliation failed")?;
                users
            } else {
                bridge
                    .search_by_email(&window, &email)
                    .await
                    .context("Reconciliation failed")?
            };

            info!(users = users.len(), "writing report");
            let json = report::render(users.users()).context("Failed to render report")?;
            write_output(output.as_deref(), &json)?;
        }
        Commands::Users { input } => {
            let snapshot = Snapshot::parse(&read_input(input.as_deref())?)?;
            let config = snapshot.config.clone().unwrap_or_default();
            let bridge = build_bridge(snapshot, config);
            let users = bridge.retrieve_all_users().await?;
            for user in users.users() {
                println!("{}\t{}", user.email, user.display_name);
            }
        }
    }

    Ok(())
}

fn build_bridge(snapshot: Snapshot, config: BridgeConfig) -> CalendarBridge {
    let (directory, free_busy, appointments) = snapshot.into_sources();
    CalendarBridge::new(Arc::new(free_busy), Arc::new(appointments), config)
        .with_directory(Arc::new(directory))
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
