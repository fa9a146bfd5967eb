//! Top-level error type for a sync run.

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::data::DataError;
use crate::store::StoreError;
use crate::symbol::SymbolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Symbol(#[from] SymbolError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SyncError {
    /// Login failures abort the whole run; everything else is per symbol.
    pub fn is_login_failure(&self) -> bool {
        matches!(self, SyncError::Data(DataError::LoginFailed { .. }))
    }
}
