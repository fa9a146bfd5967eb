//! KlineSync CLI: one command per run mode.
//!
//! Commands:
//! - `update`: append new daily rows to every record file in the data directory
//! - `backfill`: download full history for every symbol in the catalog list
//! - `rename`: add exchange prefixes to legacy `600000_ALL.csv` file names
//!
//! Exit status: 0 on success, 1 on a fatal error (config, catalog, login),
//! 2 when the run finished but some symbols failed.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use klinesync_core::data::HttpSource;
use klinesync_core::rename::rename_legacy_files;
use klinesync_core::sync::{run_backfill, run_update, RunSummary, TracingProgress};
use klinesync_core::{Catalog, SyncConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "klinesync",
    about = "Incremental daily k-line CSV sync"
)]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append rows newer than each file's last record, up to today.
    Update,
    /// Download full history for every symbol in the catalog list file.
    Backfill,
    /// Prefix legacy record file names with their exchange.
    Rename {
        /// Only print what would be renamed.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = SyncConfig::load(cli.config.as_deref()).context("loading configuration")?;
    // Computed once so every symbol in the run shares the same end date.
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Commands::Update => {
            let catalog = Catalog::scan_dir(&config.data_dir).context("scanning data directory")?;
            info!(symbols = catalog.len(), dir = %config.data_dir.display(), %today, "update run");
            let source = HttpSource::new(&config.source).context("creating data source")?;
            let summary = run_update(&source, &catalog, &config, today, &TracingProgress)
                .context("update aborted")?;
            Ok(exit_code(&summary))
        }
        Commands::Backfill => {
            let list = config.list_file_path();
            let catalog = Catalog::from_list_file(&list)
                .with_context(|| format!("reading catalog list {}", list.display()))?;
            info!(symbols = catalog.len(), start = %config.backfill_start, %today, "backfill run");
            let source = HttpSource::new(&config.source).context("creating data source")?;
            let summary = run_backfill(&source, &catalog, &config, today, &TracingProgress)
                .context("backfill aborted")?;
            Ok(exit_code(&summary))
        }
        Commands::Rename { dry_run } => {
            let renames = rename_legacy_files(&config.data_dir, dry_run)
                .context("renaming legacy files")?;
            for r in &renames {
                println!("{} -> {}", r.from.display(), r.to.display());
            }
            if dry_run {
                println!("Dry run: {} file(s) would be renamed.", renames.len());
            } else {
                println!("Renamed {} file(s).", renames.len());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_code(summary: &RunSummary) -> ExitCode {
    if summary.all_succeeded() {
        return ExitCode::SUCCESS;
    }
    for (symbol, err) in &summary.errors {
        error!(%symbol, "{err}");
    }
    ExitCode::from(2)
}
