//! Incremental fetcher: one bounded query per symbol, drained into a batch.

use crate::config::SourceConfig;
use crate::data::{DataError, QueryRequest, Row, RowBatch, Session};
use crate::store::FetchWindow;
use crate::symbol::Symbol;
use chrono::NaiveDate;
use tracing::debug;

/// Fetch every row of `window` for `symbol`.
///
/// An empty window returns an empty batch without touching the source.
/// Otherwise exactly one query is issued and its cursor drained. The batch is
/// rejected as a whole if the source resolved a different column set, a row
/// has the wrong width, or dates are not strictly increasing inside the window.
pub fn fetch_window(
    session: &Session<'_>,
    symbol: &Symbol,
    window: FetchWindow,
    fields: &[String],
    source: &SourceConfig,
) -> Result<RowBatch, DataError> {
    if window.is_empty() {
        debug!(%symbol, %window, "window is empty, no query issued");
        return Ok(RowBatch::empty(fields.to_vec()));
    }

    let request = QueryRequest {
        symbol: symbol.clone(),
        fields: fields.to_vec(),
        start: window.start,
        end: window.end,
        frequency: source.frequency.clone(),
        adjust_flag: source.adjust_flag.clone(),
    };
    let mut cursor = session.query(&request)?;

    if cursor.fields() != fields {
        return Err(DataError::SchemaMismatch {
            requested: fields.to_vec(),
            resolved: cursor.fields().to_vec(),
        });
    }

    let mut rows: Vec<Row> = Vec::new();
    let mut prev: Option<NaiveDate> = None;
    while let Some(row) = cursor.next_row()? {
        let index = rows.len();
        if row.len() != fields.len() {
            return Err(DataError::MalformedRow {
                symbol: symbol.to_string(),
                index,
                expected: fields.len(),
                actual: row.len(),
            });
        }

        let date = row_date(&row).ok_or_else(|| DataError::BadRowDate {
            symbol: symbol.to_string(),
            index,
            value: row.first().cloned().unwrap_or_default(),
        })?;
        let ordered = prev.map_or(true, |p| date > p);
        if !ordered || date < window.start || date > window.end {
            return Err(DataError::OutOfWindow {
                symbol: symbol.to_string(),
                date,
                start: window.start,
                end: window.end,
            });
        }
        prev = Some(date);
        rows.push(row);
    }

    debug!(%symbol, %window, rows = rows.len(), "query drained");
    Ok(RowBatch::new(fields.to_vec(), rows))
}

fn row_date(row: &Row) -> Option<NaiveDate> {
    let first = row.first()?;
    let prefix = first.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}
