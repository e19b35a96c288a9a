//! # shopledger
//!
//! Command-line front end for the shop ledger.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  argv ──► clap ──► AppConfig::load ──► tracing ──► Database::new       │
//! │                                                          │              │
//! │                                                          ▼              │
//! │                                            Command::run ──► stdout      │
//! │                                                 │                       │
//! │                                                 └── ApiError ──► stderr │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Successful commands print pretty JSON (or raw CSV for exports) to stdout.
//! Failures print `{"code": ..., "message": ...}` to stderr and exit non-zero.

mod commands;
mod config;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use shopledger_db::{Database, DbConfig};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::commands::{Command, Output};
use crate::config::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "shopledger", version, about = "Inventory and accounting ledger for a small shop")]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true, env = "SHOPLEDGER_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file; overrides the config
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

async fn open_database(config: &AppConfig) -> anyhow::Result<Database> {
    let path = &config.database.path;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
    }

    let db = Database::new(
        DbConfig::new(path.clone()).max_connections(config.database.max_connections),
    )
    .await
    .with_context(|| format!("Failed to open database {}", path.display()))?;

    info!(path = %path.display(), "Database ready");
    Ok(db)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.database.path = db;
    }

    init_tracing(&config);
    debug!(?config, "Configuration loaded");

    let db = open_database(&config).await?;
    let result = cli.command.run(&db, &config).await;
    db.close().await;

    match result {
        Ok(Output::Json(value)) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(ExitCode::SUCCESS)
        }
        Ok(Output::Csv(text)) => {
            print!("{}", text);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("{}", serde_json::to_string_pretty(&err)?);
            Ok(ExitCode::FAILURE)
        }
    }
}
