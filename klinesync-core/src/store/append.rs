//! Append transaction: write a fetched batch onto the end of a record file.
//!
//! The batch is encoded in memory first, then written with one `write_all`
//! under an exclusive advisory lock. If the write or the sync fails, the file
//! is truncated back to its length before the transaction, so readers never
//! observe a partial row.

use super::StoreError;
use crate::data::RowBatch;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, error};

/// Append `batch` to the file at `path`, returning the number of rows written.
///
/// An empty batch leaves the file untouched (it is not even opened). A missing
/// or zero-length file is created and receives the header row in the same
/// write; an existing file never gets a header.
pub fn append_batch(path: &Path, batch: &RowBatch) -> Result<usize, StoreError> {
    if batch.is_empty() {
        return Ok(0);
    }

    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| StoreError::io(path, e))?;

    FileExt::lock_exclusive(&file).map_err(|e| StoreError::io(path, e))?;
    let result = append_locked(&mut file, path, batch);
    if let Err(e) = FileExt::unlock(&file) {
        debug!(path = %path.display(), error = %e, "unlock failed, lock released on close");
    }
    result
}

fn append_locked(file: &mut File, path: &Path, batch: &RowBatch) -> Result<usize, StoreError> {
    let original_len = file.metadata().map_err(|e| StoreError::io(path, e))?.len();
    let needs_newline = if original_len > 0 {
        !ends_with_newline(file, original_len).map_err(|e| StoreError::io(path, e))?
    } else {
        false
    };

    let payload = encode_batch(batch, original_len == 0, needs_newline)?;
    commit(file, &payload, original_len).map_err(|e| StoreError::io(path, e))?;

    debug!(
        path = %path.display(),
        rows = batch.len(),
        bytes = payload.len(),
        "appended batch"
    );
    Ok(batch.len())
}

fn ends_with_newline(file: &mut File, len: u64) -> io::Result<bool> {
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Serialize the batch as headerless CSV in the batch's column order.
pub(crate) fn encode_batch(
    batch: &RowBatch,
    with_header: bool,
    leading_newline: bool,
) -> Result<Vec<u8>, StoreError> {
    let mut buf = Vec::new();
    if leading_newline {
        buf.push(b'\n');
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(buf);
    if with_header {
        writer.write_record(batch.fields())?;
    }
    for row in batch.rows() {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| StoreError::Serialize(csv::Error::from(e.into_error())))
}

/// A sink that can be rolled back to an earlier length.
trait Truncate: Write {
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
}

impl Truncate for File {
    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

fn commit<T: Truncate>(sink: &mut T, payload: &[u8], original_len: u64) -> io::Result<()> {
    let outcome = sink.write_all(payload).and_then(|()| sink.sync());
    if let Err(e) = outcome {
        if let Err(rollback) = sink.truncate_to(original_len).and_then(|()| sink.sync()) {
            error!(error = %rollback, original_len, "rollback after failed append also failed");
        }
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RowBatch;
    use std::fs;

    fn fields() -> Vec<String> {
        ["date", "open", "close"].iter().map(|s| s.to_string()).collect()
    }

    fn batch(rows: &[&[&str]]) -> RowBatch {
        RowBatch::new(
            fields(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn empty_batch_leaves_missing_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sh.600000.csv");
        assert_eq!(append_batch(&path, &batch(&[])).unwrap(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn empty_batch_leaves_existing_file_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sh.600000.csv");
        fs::write(&path, "date,open,close\n2021-02-04,1,2\n").unwrap();
        assert_eq!(append_batch(&path, &batch(&[])).unwrap(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "date,open,close\n2021-02-04,1,2\n");
    }

    #[test]
    fn appends_without_header_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sh.600000.csv");
        fs::write(&path, "date,open,close\n2021-02-03,1,2\n").unwrap();

        let n = append_batch(&path, &batch(&[&["2021-02-04", "2", "3"], &["2021-02-05", "3", "4"]]))
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "date,open,close\n2021-02-03,1,2\n2021-02-04,2,3\n2021-02-05,3,4\n"
        );
    }

    #[test]
    fn new_file_gets_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sz.000001.csv");
        append_batch(&path, &batch(&[&["2017-04-20", "9", "10"]])).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "date,open,close\n2017-04-20,9,10\n");
    }

    #[test]
    fn missing_trailing_newline_is_repaired() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sh.600000.csv");
        fs::write(&path, "date,open,close\n2021-02-03,1,2").unwrap();
        append_batch(&path, &batch(&[&["2021-02-04", "2", "3"]])).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "date,open,close\n2021-02-03,1,2\n2021-02-04,2,3\n"
        );
    }

    /// Accepts a few bytes, then fails every write.
    struct FlakySink {
        data: Vec<u8>,
        budget: usize,
    }

    impl Write for FlakySink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            let n = buf.len().min(self.budget);
            self.data.extend_from_slice(&buf[..n]);
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Truncate for FlakySink {
        fn truncate_to(&mut self, len: u64) -> io::Result<()> {
            self.data.truncate(len as usize);
            Ok(())
        }

        fn sync(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_write_rolls_back_partial_rows() {
        let existing = b"date,open,close\n2021-02-03,1,2\n".to_vec();
        let original_len = existing.len() as u64;
        let mut sink = FlakySink {
            data: existing.clone(),
            budget: 7,
        };
        let payload = encode_batch(&batch(&[&["2021-02-04", "2", "3"]]), false, false).unwrap();

        let err = commit(&mut sink, &payload, original_len).unwrap_err();
        assert_eq!(err.to_string(), "disk full");
        assert_eq!(sink.data, existing);
    }

    #[test]
    fn values_with_commas_are_quoted() {
        let payload = encode_batch(&batch(&[&["2021-02-04", "1,5", ""]]), false, false).unwrap();
        assert_eq!(payload, b"2021-02-04,\"1,5\",\n");
    }
}
