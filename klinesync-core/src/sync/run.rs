//! Run orchestration: one session, symbols processed in catalog order.

use super::fetch::fetch_window;
use super::progress::SyncProgress;
use super::{RunSummary, SymbolOutcome};
use crate::catalog::{Catalog, CatalogEntry};
use crate::config::SyncConfig;
use crate::data::{DataSource, Session};
use crate::error::SyncError;
use crate::store::{self, FetchWindow, LastRecord};
use crate::symbol::RunMode;
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::warn;

/// Bring one symbol's file up to `today`: locate → window → fetch → append.
///
/// A file whose header declares other columns than `config.fields` fails
/// before any query. On any error the file is left exactly as it was.
pub fn sync_symbol(
    session: &Session<'_>,
    entry: &CatalogEntry,
    config: &SyncConfig,
    today: NaiveDate,
    progress: &dyn SyncProgress,
) -> Result<SymbolOutcome, SyncError> {
    let path = record_path(entry, config, RunMode::Update);
    let last = store::read_last_record(&path, config.date_column())
        .map_err(|e| store::StoreError::Io {
            path: path.clone(),
            source: e,
        })?;
    if last != LastRecord::Absent {
        store::verify_header(&path, &config.fields, config.date_column())?;
    }
    let window = store::compute_window(&last, config.default_start, today, config.corrupt_tail)?;
    progress.on_window(&entry.symbol, &window);

    let batch = fetch_window(session, &entry.symbol, window, &config.fields, &config.source)?;
    let rows_written = store::append_batch(&path, &batch)?;

    Ok(SymbolOutcome {
        symbol: entry.symbol.clone(),
        path,
        window,
        rows_written,
    })
}

/// Download the full history of one symbol and replace its backfill file.
pub fn backfill_symbol(
    session: &Session<'_>,
    entry: &CatalogEntry,
    config: &SyncConfig,
    today: NaiveDate,
    progress: &dyn SyncProgress,
) -> Result<SymbolOutcome, SyncError> {
    let path = record_path(entry, config, RunMode::Backfill);
    let window = FetchWindow::new(config.backfill_start, today);
    progress.on_window(&entry.symbol, &window);

    let rows_written = if window.is_empty() {
        0
    } else {
        let batch = fetch_window(session, &entry.symbol, window, &config.fields, &config.source)?;
        store::write_full_history(&path, &batch)?
    };

    Ok(SymbolOutcome {
        symbol: entry.symbol.clone(),
        path,
        window,
        rows_written,
    })
}

/// Incremental update of every catalog entry.
///
/// Login failure is returned before any file is touched. Per-symbol failures
/// are collected in the summary and the loop continues.
pub fn run_update(
    source: &dyn DataSource,
    catalog: &Catalog,
    config: &SyncConfig,
    today: NaiveDate,
    progress: &dyn SyncProgress,
) -> Result<RunSummary, SyncError> {
    run_with_session(source, catalog, config, today, progress, sync_symbol)
}

/// Full backfill of every catalog entry.
pub fn run_backfill(
    source: &dyn DataSource,
    catalog: &Catalog,
    config: &SyncConfig,
    today: NaiveDate,
    progress: &dyn SyncProgress,
) -> Result<RunSummary, SyncError> {
    run_with_session(source, catalog, config, today, progress, backfill_symbol)
}

type SymbolStep = fn(
    &Session<'_>,
    &CatalogEntry,
    &SyncConfig,
    NaiveDate,
    &dyn SyncProgress,
) -> Result<SymbolOutcome, SyncError>;

fn run_with_session(
    source: &dyn DataSource,
    catalog: &Catalog,
    config: &SyncConfig,
    today: NaiveDate,
    progress: &dyn SyncProgress,
    step: SymbolStep,
) -> Result<RunSummary, SyncError> {
    let session = Session::open(source)?;
    let total = catalog.len();
    let mut summary = RunSummary::new(total);

    for (i, entry) in catalog.entries().iter().enumerate() {
        progress.on_start(&entry.symbol, i, total);
        let result = step(&session, entry, config, today, progress);
        progress.on_complete(&entry.symbol, i, total, &result);
        summary.record(&entry.symbol, result);
    }

    if let Err(e) = session.close() {
        warn!(error = %e, "logout failed");
    }
    progress.on_batch_complete(&summary);
    Ok(summary)
}

fn record_path(entry: &CatalogEntry, config: &SyncConfig, mode: RunMode) -> PathBuf {
    match (&entry.path, mode) {
        (Some(path), RunMode::Update) => path.clone(),
        _ => config.data_dir.join(entry.symbol.file_name(mode)),
    }
}
