//! Progress callbacks for multi-symbol runs.

use super::{RunSummary, SymbolOutcome};
use crate::error::SyncError;
use crate::store::FetchWindow;
use crate::symbol::Symbol;
use tracing::{info, warn};

/// Progress callback for multi-symbol operations.
pub trait SyncProgress {
    /// Called when starting a symbol.
    fn on_start(&self, symbol: &Symbol, index: usize, total: usize);

    /// Called once the symbol's fetch window is known.
    fn on_window(&self, symbol: &Symbol, window: &FetchWindow);

    /// Called when a symbol finishes, successfully or not.
    fn on_complete(
        &self,
        symbol: &Symbol,
        index: usize,
        total: usize,
        result: &Result<SymbolOutcome, SyncError>,
    );

    /// Called when the entire run is done.
    fn on_batch_complete(&self, summary: &RunSummary);
}

/// Reports progress through `tracing`.
pub struct TracingProgress;

impl SyncProgress for TracingProgress {
    fn on_start(&self, symbol: &Symbol, index: usize, total: usize) {
        info!("[{}/{}] {symbol}", index + 1, total);
    }

    fn on_window(&self, symbol: &Symbol, window: &FetchWindow) {
        if window.is_empty() {
            info!(%symbol, start = %window.start, "up to date");
        } else {
            info!(%symbol, start = %window.start, end = %window.end, "fetching");
        }
    }

    fn on_complete(
        &self,
        symbol: &Symbol,
        _index: usize,
        _total: usize,
        result: &Result<SymbolOutcome, SyncError>,
    ) {
        match result {
            Ok(outcome) => info!(%symbol, rows = outcome.rows_written, "done"),
            Err(e) => warn!(%symbol, error = %e, "failed, file left unchanged"),
        }
    }

    fn on_batch_complete(&self, summary: &RunSummary) {
        info!(
            total = summary.total,
            updated = summary.updated,
            up_to_date = summary.up_to_date,
            failed = summary.failed,
            rows = summary.rows_written,
            "run complete"
        );
    }
}

/// Discards all progress events.
pub struct NoProgress;

impl SyncProgress for NoProgress {
    fn on_start(&self, _: &Symbol, _: usize, _: usize) {}
    fn on_window(&self, _: &Symbol, _: &FetchWindow) {}
    fn on_complete(&self, _: &Symbol, _: usize, _: usize, _: &Result<SymbolOutcome, SyncError>) {}
    fn on_batch_complete(&self, _: &RunSummary) {}
}
