//! Full-history writer for backfill runs.
//!
//! Unlike the incremental append, a backfill replaces the whole file: header
//! plus every fetched row goes to `{file}.tmp`, is synced, then renamed over
//! the target. A crash leaves either the old file or the new one.

use super::append::encode_batch;
use super::StoreError;
use crate::data::RowBatch;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Replace the file at `path` with header + `batch`. Returns rows written.
pub fn write_full_history(path: &Path, batch: &RowBatch) -> Result<usize, StoreError> {
    let payload = encode_batch(batch, true, false)?;
    let tmp_path = path.with_extension("csv.tmp");

    let write_tmp = || -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(&tmp_path)?;
        file.write_all(&payload)?;
        file.sync_all()
    };
    if let Err(e) = write_tmp() {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::io(&tmp_path, e));
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        StoreError::io(path, e)
    })?;

    Ok(batch.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{read_last_record, LastRecord};

    fn fields() -> Vec<String> {
        vec!["date".into(), "close".into()]
    }

    #[test]
    fn replaces_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sh.600000_ALL.csv");
        fs::write(&path, "stale\n").unwrap();

        let batch = RowBatch::new(
            fields(),
            vec![
                vec!["2014-01-02".into(), "9.1".into()],
                vec!["2014-01-03".into(), "9.2".into()],
            ],
        );
        assert_eq!(write_full_history(&path, &batch).unwrap(), 2);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "date,close\n2014-01-02,9.1\n2014-01-03,9.2\n"
        );
        assert!(!path.with_extension("csv.tmp").exists());
    }

    #[test]
    fn empty_history_leaves_header_only_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sz.300001_ALL.csv");
        write_full_history(&path, &RowBatch::new(fields(), Vec::new())).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "date,close\n");
        assert_eq!(read_last_record(&path, "date").unwrap(), LastRecord::Header);
    }
}
