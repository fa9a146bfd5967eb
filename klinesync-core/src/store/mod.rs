//! Record-file store: one append-only CSV per symbol.
//!
//! - [`locator`] finds and classifies the last row without a full scan
//! - [`window`] turns that row into the next fetch window
//! - [`append`] writes a fetched batch as one all-or-nothing transaction
//! - [`backfill`] replaces a file wholesale with a full history download
//! - [`header`] checks that a file's declared columns match the batch layout

pub mod append;
pub mod backfill;
pub mod header;
pub mod locator;
pub mod window;

pub use append::append_batch;
pub use backfill::write_full_history;
pub use header::{read_header, verify_header};
pub use locator::{locate_last_line, locate_last_record_line, read_last_record, LastRecord};
pub use window::{compute_start_date, compute_window, CorruptTailPolicy, FetchWindow};

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize rows: {0}")]
    Serialize(#[from] csv::Error),

    #[error("last line is not a dated row or header: '{0}' (set corrupt_tail = \"refetch\" to override)")]
    CorruptTail(String),

    #[error("failed to read header of {path}: {source}")]
    HeaderRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} declares columns {found:?}, expected {expected:?}")]
    SchemaMismatch {
        path: PathBuf,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("date arithmetic overflow after {0}")]
    DateOverflow(NaiveDate),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
