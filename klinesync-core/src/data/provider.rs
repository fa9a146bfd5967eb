//! Data source trait and structured error types.
//!
//! The DataSource trait abstracts the remote k-line service (login, bounded
//! history query, logout) so the HTTP client can be swapped for a mock in tests.

use crate::symbol::Symbol;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One fetched row: string values in requested-field order.
pub type Row = Vec<String>;

/// Status pair returned by every remote call. `"0"` means success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    #[serde(rename = "error_code")]
    pub code: String,
    #[serde(rename = "error_msg", default)]
    pub message: String,
}

impl Status {
    pub const SUCCESS: &'static str = "0";

    pub fn is_success(&self) -> bool {
        self.code == Self::SUCCESS
    }
}

/// Structured error types for remote-source operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("login failed ({code}): {message}")]
    LoginFailed { code: String, message: String },

    #[error("query for {symbol} failed ({code}): {message}")]
    QueryFailed {
        symbol: String,
        code: String,
        message: String,
    },

    #[error("source returned fields {resolved:?}, expected {requested:?}")]
    SchemaMismatch {
        requested: Vec<String>,
        resolved: Vec<String>,
    },

    #[error("row {index} for {symbol} has {actual} values, expected {expected}")]
    MalformedRow {
        symbol: String,
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("row {index} for {symbol} has bad date '{value}'")]
    BadRowDate {
        symbol: String,
        index: usize,
        value: String,
    },

    #[error("row dated {date} for {symbol} is out of order or outside {start}..={end}")]
    OutOfWindow {
        symbol: String,
        date: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),
}

/// Opaque token for an authenticated session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionHandle {
    pub token: String,
}

/// A bounded daily history query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub symbol: Symbol,
    pub fields: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Bar frequency, `"d"` for daily.
    pub frequency: String,
    /// Price adjustment mode, `"3"` for unadjusted.
    pub adjust_flag: String,
}

/// Result cursor of one query.
pub trait RowCursor {
    /// Fields the source actually resolved, in column order.
    fn fields(&self) -> &[String];

    /// Next row, `Ok(None)` when exhausted. A non-success row status
    /// surfaces as `Err`.
    fn next_row(&mut self) -> Result<Option<Row>, DataError>;
}

/// Trait for remote k-line sources.
///
/// Implementations handle transport and wire format only; window
/// computation and file handling live above this trait.
pub trait DataSource {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Authenticate. A non-success status maps to [`DataError::LoginFailed`].
    fn login(&self) -> Result<SessionHandle, DataError>;

    /// Issue one bounded history query.
    fn query<'a>(
        &'a self,
        session: &SessionHandle,
        request: &QueryRequest,
    ) -> Result<Box<dyn RowCursor + 'a>, DataError>;

    /// Release the session.
    fn logout(&self, session: SessionHandle) -> Result<(), DataError>;
}

/// Ordered rows fetched for one symbol and one window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowBatch {
    fields: Vec<String>,
    rows: Vec<Row>,
}

impl RowBatch {
    pub fn new(fields: Vec<String>, rows: Vec<Row>) -> Self {
        Self { fields, rows }
    }

    pub fn empty(fields: Vec<String>) -> Self {
        Self::new(fields, Vec::new())
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Cursor over rows already held in memory.
#[derive(Debug)]
pub struct VecCursor {
    fields: Vec<String>,
    rows: std::vec::IntoIter<Row>,
}

impl VecCursor {
    pub fn new(fields: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            fields,
            rows: rows.into_iter(),
        }
    }
}

impl RowCursor for VecCursor {
    fn fields(&self) -> &[String] {
        &self.fields
    }

    fn next_row(&mut self) -> Result<Option<Row>, DataError> {
        Ok(self.rows.next())
    }
}
