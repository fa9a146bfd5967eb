//! Per-run synchronization of record files with the remote source.

pub mod fetch;
pub mod progress;
pub mod run;

pub use fetch::fetch_window;
pub use progress::{NoProgress, SyncProgress, TracingProgress};
pub use run::{backfill_symbol, run_backfill, run_update, sync_symbol};

use crate::error::SyncError;
use crate::store::FetchWindow;
use crate::symbol::Symbol;
use std::path::PathBuf;

/// Result of processing one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolOutcome {
    pub symbol: Symbol,
    pub path: PathBuf,
    pub window: FetchWindow,
    pub rows_written: usize,
}

/// Summary of a run across all catalog symbols.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub total: usize,
    /// Symbols that received at least one row.
    pub updated: usize,
    /// Symbols that succeeded with nothing new.
    pub up_to_date: usize,
    pub failed: usize,
    pub rows_written: usize,
    pub errors: Vec<(Symbol, SyncError)>,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, symbol: &Symbol, result: Result<SymbolOutcome, SyncError>) {
        match result {
            Ok(outcome) if outcome.rows_written > 0 => {
                self.updated += 1;
                self.rows_written += outcome.rows_written;
            }
            Ok(_) => self.up_to_date += 1,
            Err(e) => {
                self.failed += 1;
                self.errors.push((symbol.clone(), e));
            }
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}
