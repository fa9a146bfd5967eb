//! KlineSync Core: incremental sync of per-symbol daily k-line CSV files.
//!
//! Each symbol's history lives in one append-only CSV file; the file itself is
//! the checkpoint. A run:
//! - finds the last stored row by probing backwards from end-of-file
//! - turns its date into the next fetch window (through today)
//! - issues one bounded query per symbol over a single scoped session
//! - appends the fetched rows as one all-or-nothing write

pub mod catalog;
pub mod config;
pub mod data;
pub mod error;
pub mod rename;
pub mod store;
pub mod symbol;
pub mod sync;

pub use catalog::{Catalog, CatalogEntry};
pub use config::SyncConfig;
pub use error::SyncError;
pub use symbol::{Exchange, RunMode, Symbol};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: per-symbol values can move across threads, so a
    /// parallel driver can hand one symbol to each worker.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Symbol>();
        require_sync::<Symbol>();
        require_send::<CatalogEntry>();
        require_sync::<CatalogEntry>();
        require_send::<SyncConfig>();
        require_sync::<SyncConfig>();
        require_send::<data::RowBatch>();
        require_sync::<data::RowBatch>();
        require_send::<store::LastRecord>();
        require_sync::<store::LastRecord>();
        require_send::<store::FetchWindow>();
        require_sync::<store::FetchWindow>();
        require_send::<sync::SymbolOutcome>();
        require_sync::<sync::SymbolOutcome>();
        require_send::<SyncError>();
    }
}
