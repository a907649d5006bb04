//! Scratchpad panel host.
//!
//! Runs one scratchpad panel whose view talks JSON lines over stdio.
//!
//! Usage:
//!   # Default database under the user's data dir
//!   cargo run -p scratchpad-host
//!
//!   # Throwaway session
//!   cargo run -p scratchpad-host -- --in-memory --dialogs approve
//!
//! Logs go to stderr; stdout carries the protocol.

mod bridge;
mod config;
mod dialogs;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::{EnvFilter, fmt};

use scratchpad_engine::{HostDialogs, PolicyDialogs, spawn_panel};
use scratchpad_store::{KvStore, MemoryStore, SqliteStore, TabStore};

use crate::config::{DialogMode, HostConfig};
use crate::dialogs::TerminalDialogs;

/// Multi-tab scratchpad panel over stdio.
#[derive(Parser, Debug)]
#[command(name = "scratchpad-host")]
#[command(about = "Host a scratchpad panel over a JSON-lines stdio channel")]
struct Args {
    /// Config file (default: ~/.config/scratchpad/config.ron)
    #[arg(long)]
    config: Option<PathBuf>,

    /// SQLite database holding the tab state
    #[arg(long, conflicts_with = "in_memory")]
    database: Option<PathBuf>,

    /// Keep state in memory only
    #[arg(long)]
    in_memory: bool,

    /// Quiet period before content edits are written
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// How close/rename dialogs are answered
    #[arg(long, value_enum)]
    dialogs: Option<DialogMode>,
}

impl Args {
    fn apply(&self, config: &mut HostConfig) {
        if let Some(database) = &self.database {
            config.database = Some(database.clone());
        }
        if let Some(debounce_ms) = self.debounce_ms {
            config.debounce_ms = debounce_ms;
        }
        if let Some(dialogs) = self.dialogs {
            config.dialogs = dialogs;
        }
    }
}

fn open_store(args: &Args, config: &HostConfig) -> Result<TabStore> {
    let kv: Arc<dyn KvStore> = if args.in_memory {
        tracing::info!("using in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        let path = config
            .database_path()
            .context("no data directory available; pass --database")?;
        tracing::info!(path = %path.display(), "opening database");
        Arc::new(
            SqliteStore::open(&path)
                .with_context(|| format!("failed to open {}", path.display()))?,
        )
    };
    let store = TabStore::with_key(kv, config.state_key.clone());

    if let Some(legacy) = &config.legacy_file {
        if let Err(e) = store.import_legacy_file(legacy) {
            tracing::warn!(path = %legacy.display(), error = %e, "legacy import failed");
        }
    }
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout is the protocol channel
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();
    let mut config = HostConfig::load(args.config.as_deref());
    args.apply(&mut config);

    let store = open_store(&args, &config)?;
    let dialogs: Arc<dyn HostDialogs> = match config.dialogs {
        DialogMode::Terminal => Arc::new(TerminalDialogs::new()),
        DialogMode::Approve => Arc::new(PolicyDialogs::approve_all()),
        DialogMode::Reject => Arc::new(PolicyDialogs::reject_all()),
    };

    let (handle, view) = spawn_panel(store, dialogs, config.engine_config());
    tracing::info!(debounce_ms = config.debounce_ms, "scratchpad panel ready");

    let interrupted = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    bridge::run_bridge(
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        handle,
        view,
        interrupted,
    )
    .await?;

    tracing::info!("scratchpad panel shut down");
    Ok(())
}
