//! Symbol catalog: the ordered list of symbols a run processes.
//!
//! Backfill reads a list file (first column of each row, e.g. `600000.sh`);
//! update walks the data directory for existing `sh*.csv` / `sz*.csv` files.

use crate::symbol::Symbol;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog list {path}: {source}")]
    ListRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to scan data directory {path}: {source}")]
    DirScan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One catalog entry: the symbol and, for directory scans, the file it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub symbol: Symbol,
    pub path: Option<PathBuf>,
}

/// Ordered list of symbols to process. List-file catalogs hold each symbol
/// once; directory scans hold one entry per record file.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn from_symbols(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        let mut catalog = Self::default();
        let mut seen = HashSet::new();
        for symbol in symbols {
            if seen.insert(symbol.clone()) {
                catalog.entries.push(CatalogEntry { symbol, path: None });
            }
        }
        catalog
    }

    /// Load a catalog list file.
    ///
    /// Only the first column is read. A leading row that does not parse as a
    /// symbol is treated as a header; later unparseable rows are skipped.
    pub fn from_list_file(path: &Path) -> Result<Self, CatalogError> {
        let list_err = |source| CatalogError::ListRead {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .map_err(list_err)?;

        let mut symbols = Vec::new();
        for (row_idx, record) in reader.records().enumerate() {
            let record = record.map_err(list_err)?;
            let Some(first) = record.get(0) else {
                continue;
            };
            match Symbol::parse(first) {
                Ok(sym) => symbols.push(sym),
                Err(e) if row_idx == 0 => {
                    debug!(cell = first, error = %e, "skipping catalog header row");
                }
                Err(e) => {
                    warn!(row = row_idx + 1, cell = first, error = %e, "skipping catalog entry");
                }
            }
        }

        Ok(Self::from_symbols(symbols))
    }

    /// Collect record files already present in `dir`.
    ///
    /// Matches `sh*.csv` and `sz*.csv`, sorted by file name. Every file is an
    /// entry of its own, so a symbol with both `sh.X.csv` and `sh.X_ALL.csv`
    /// has both brought up to date.
    pub fn scan_dir(dir: &Path) -> Result<Self, CatalogError> {
        let scan_err = |source| CatalogError::DirScan {
            path: dir.to_path_buf(),
            source,
        };

        let mut names: Vec<String> = Vec::new();
        for entry in fs::read_dir(dir).map_err(scan_err)? {
            let entry = entry.map_err(scan_err)?;
            if !entry.file_type().map_err(scan_err)?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if is_record_file_name(&name) {
                names.push(name);
            }
        }
        names.sort();

        let mut catalog = Self::default();
        for name in names {
            match Symbol::from_file_name(&name) {
                Ok(symbol) => catalog.entries.push(CatalogEntry {
                    symbol,
                    path: Some(dir.join(&name)),
                }),
                Err(e) => warn!(file = %name, error = %e, "unrecognized record file name"),
            }
        }
        Ok(catalog)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.entries.iter().map(|e| &e.symbol)
    }
}

fn is_record_file_name(name: &str) -> bool {
    (name.starts_with("sh") || name.starts_with("sz")) && name.ends_with(".csv")
}
