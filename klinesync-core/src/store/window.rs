//! Fetch-window calculation from the last stored record.

use super::locator::LastRecord;
use super::StoreError;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// What to do when the last line of a file is neither a header nor a dated row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptTailPolicy {
    /// Refuse to sync the symbol; the file needs repair first.
    #[default]
    Fail,
    /// Log and refetch from the default start date.
    Refetch,
}

/// Inclusive date range requested from the remote source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// An inverted window holds no days and must never reach the source.
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

impl fmt::Display for FetchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Next date to fetch given the file's last record.
///
/// Missing, all-whitespace and header-only files start at `default_start`; a dated
/// row starts the day after it. A corrupt tail follows `policy`.
pub fn compute_start_date(
    last: &LastRecord,
    default_start: NaiveDate,
    policy: CorruptTailPolicy,
) -> Result<NaiveDate, StoreError> {
    match last {
        LastRecord::Absent | LastRecord::Header => Ok(default_start),
        LastRecord::Empty => {
            warn!(%default_start, "file holds only whitespace, falling back to default start");
            Ok(default_start)
        }
        LastRecord::DataRow(date) => date
            .checked_add_days(Days::new(1))
            .ok_or(StoreError::DateOverflow(*date)),
        LastRecord::Corrupt(line) => match policy {
            CorruptTailPolicy::Fail => Err(StoreError::CorruptTail(line.clone())),
            CorruptTailPolicy::Refetch => {
                warn!(line = %line, %default_start, "unparseable last line, refetching from default start");
                Ok(default_start)
            }
        },
    }
}

/// Window from the computed start through `today`.
pub fn compute_window(
    last: &LastRecord,
    default_start: NaiveDate,
    today: NaiveDate,
    policy: CorruptTailPolicy,
) -> Result<FetchWindow, StoreError> {
    Ok(FetchWindow::new(
        compute_start_date(last, default_start, policy)?,
        today,
    ))
}
