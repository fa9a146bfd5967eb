//! Last-record locator.
//!
//! Finds the final line of an append-only record file by probing backwards
//! from end-of-file with a doubling window, so a large file costs a few small
//! reads instead of a full scan. The probe loop is bounded by the file size;
//! once the window would cover the whole file, the file is read from the start.

use chrono::NaiveDate;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, trace};

/// Initial probe window, in bytes back from end-of-file.
pub const DEFAULT_INITIAL_PROBE: u64 = 8;

/// Number of leading bytes of the first column that hold the calendar date.
const DATE_PREFIX_LEN: usize = 10;

/// Return the last line of `reader`, without its line terminator.
///
/// `None` means the stream has zero length.
pub fn locate_last_line<R: Read + Seek>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    locate_last_line_with_probe(reader, DEFAULT_INITIAL_PROBE)
}

/// Same as [`locate_last_line`] with an explicit initial probe size.
///
/// The result does not depend on `initial_probe`; only the number of reads
/// does. A probe of zero is treated as one byte.
pub fn locate_last_line_with_probe<R: Read + Seek>(
    reader: &mut R,
    initial_probe: u64,
) -> io::Result<Option<Vec<u8>>> {
    locate(reader, initial_probe, Tail::Raw)
}

/// Return the last line that holds anything besides whitespace, trimmed.
///
/// Trailing blank lines are skipped. An all-whitespace stream yields an empty
/// line; a zero-length stream yields `None`.
pub fn locate_last_record_line<R: Read + Seek>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    locate_last_record_line_with_probe(reader, DEFAULT_INITIAL_PROBE)
}

/// Same as [`locate_last_record_line`] with an explicit initial probe size.
pub fn locate_last_record_line_with_probe<R: Read + Seek>(
    reader: &mut R,
    initial_probe: u64,
) -> io::Result<Option<Vec<u8>>> {
    locate(reader, initial_probe, Tail::SkipBlank)
}

#[derive(Debug, Clone, Copy)]
enum Tail {
    /// Exactly one trailing newline terminates the last line.
    Raw,
    /// Any run of trailing whitespace, blank lines included, is ignored.
    SkipBlank,
}

fn locate<R: Read + Seek>(
    reader: &mut R,
    initial_probe: u64,
    tail: Tail,
) -> io::Result<Option<Vec<u8>>> {
    let len = reader.seek(SeekFrom::End(0))?;
    if len == 0 {
        return Ok(None);
    }

    let mut buf = Vec::new();
    let mut probe = initial_probe.max(1);

    // Invariant: probe < len, so the seek target is strictly inside the file.
    while probe < len {
        let offset = i64::try_from(probe)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "probe exceeds i64"))?;
        reader.seek(SeekFrom::End(-offset))?;
        buf.clear();
        reader.read_to_end(&mut buf)?;

        // The last line starts after a newline we actually saw, so it cannot
        // be truncated by the window.
        if let (line, true) = split_last_line(&buf, tail) {
            trace!(probe, len, "last line found in tail window");
            return Ok(Some(line.to_vec()));
        }
        probe = probe.saturating_mul(2);
    }

    debug!(len, "tail probe covered whole file, reading from start");
    reader.seek(SeekFrom::Start(0))?;
    buf.clear();
    reader.read_to_end(&mut buf)?;
    Ok(Some(split_last_line(&buf, tail).0.to_vec()))
}

/// Last line of `buf` without its terminator, and whether a newline was seen
/// before it (meaning the line is complete even if `buf` is only a tail).
fn split_last_line(buf: &[u8], tail: Tail) -> (&[u8], bool) {
    let body = match tail {
        Tail::Raw => buf.strip_suffix(b"\n").unwrap_or(buf),
        Tail::SkipBlank => trim_ascii_end(buf),
    };
    match body.iter().rposition(|&b| b == b'\n') {
        Some(pos) => (strip_cr(&body[pos + 1..]), true),
        None => (strip_cr(body), false),
    }
}

fn strip_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn trim_ascii_end(buf: &[u8]) -> &[u8] {
    let end = buf
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    &buf[..end]
}

/// Classified final row of a record file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastRecord {
    /// File missing or zero-length.
    Absent,
    /// File holds only whitespace.
    Empty,
    /// Last line is the column header: the file has no data rows yet.
    Header,
    /// Last line is a data row for this date.
    DataRow(NaiveDate),
    /// Last line has neither a header nor a parseable date.
    Corrupt(String),
}

impl LastRecord {
    /// Classify a raw last line. `date_column` is the name of the first
    /// column in the header row.
    pub fn classify(line: &[u8], date_column: &str) -> Self {
        let text = String::from_utf8_lossy(line);
        let text = text.trim_start_matches('\u{feff}');
        if text.trim().is_empty() {
            return LastRecord::Empty;
        }

        let first = text.split(',').next().unwrap_or("").trim();
        if first.eq_ignore_ascii_case(date_column) {
            return LastRecord::Header;
        }

        first
            .get(..DATE_PREFIX_LEN)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
            .map(LastRecord::DataRow)
            .unwrap_or_else(|| LastRecord::Corrupt(preview(text)))
    }

    /// Date of the last stored row, if there is one.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            LastRecord::DataRow(d) => Some(*d),
            _ => None,
        }
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 64;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Locate and classify the last record of the file at `path`.
///
/// Trailing blank lines are skipped, so a file with data rows followed by an
/// empty line still reports its last dated row.
pub fn read_last_record(path: &Path, date_column: &str) -> io::Result<LastRecord> {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LastRecord::Absent),
        Err(e) => return Err(e),
    };

    Ok(match locate_last_record_line(&mut file)? {
        None => LastRecord::Absent,
        Some(line) => LastRecord::classify(&line, date_column),
    })
}
