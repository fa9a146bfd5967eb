//! Column-layout check for existing record files.
//!
//! Appends are headerless, so every batch must match the columns the file
//! already declares. Files whose first line is a data row (legacy, headerless)
//! carry no layout to check against.

use super::StoreError;
use std::fs::File;
use std::io;
use std::path::Path;

/// Read the header row of the file at `path`.
///
/// Returns `None` for a missing or empty file, or when the first row is not a
/// header (its first field is not `date_column`).
pub fn read_header(path: &Path, date_column: &str) -> Result<Option<Vec<String>>, StoreError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(path, e)),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);
    let mut record = csv::ByteRecord::new();
    let found = reader
        .read_byte_record(&mut record)
        .map_err(|source| StoreError::HeaderRead {
            path: path.to_path_buf(),
            source,
        })?;
    if !found {
        return Ok(None);
    }

    let columns: Vec<String> = record
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let raw = String::from_utf8_lossy(field);
            let text: &str = if i == 0 {
                raw.trim_start_matches('\u{feff}')
            } else {
                &raw
            };
            text.trim().to_string()
        })
        .collect();

    match columns.first() {
        Some(first) if first.eq_ignore_ascii_case(date_column) => Ok(Some(columns)),
        _ => Ok(None),
    }
}

/// Fail if the file at `path` declares a header that differs from `fields`.
pub fn verify_header(path: &Path, fields: &[String], date_column: &str) -> Result<(), StoreError> {
    match read_header(path, date_column)? {
        Some(found) if found != fields => Err(StoreError::SchemaMismatch {
            path: path.to_path_buf(),
            expected: fields.to_vec(),
            found,
        }),
        _ => Ok(()),
    }
}
