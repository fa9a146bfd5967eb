//! Shared test fixtures: an in-memory data source and record-file helpers.

#![allow(dead_code)]

use chrono::{Datelike, Days, NaiveDate, Weekday};
use klinesync_core::config::DEFAULT_FIELDS;
use klinesync_core::data::{
    DataError, DataSource, QueryRequest, Row, RowCursor, SessionHandle, VecCursor,
};
use klinesync_core::Symbol;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashSet};

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn fields() -> Vec<String> {
    DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect()
}

pub fn header_line() -> String {
    DEFAULT_FIELDS.join(",")
}

/// A plausible daily row for `date`.
pub fn row_for(date: NaiveDate) -> Row {
    let base = 10.0 + f64::from(date.ordinal()) / 100.0;
    vec![
        date.format("%Y-%m-%d").to_string(),
        format!("{base:.2}"),
        "8.123456".into(),
        "0.912345".into(),
        "1".into(),
        format!("{:.2}", base + 0.1),
        format!("{:.2}", base + 0.3),
        format!("{:.2}", base - 0.2),
    ]
}

pub fn row_line(date: NaiveDate) -> String {
    row_for(date).join(",")
}

/// Weekday rows from `start` through `end` inclusive.
pub fn trading_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut day = start;
    while day <= end {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(day);
        }
        day = day.checked_add_days(Days::new(1)).unwrap();
    }
    days
}

/// In-memory remote source with a fixed history per symbol.
pub struct MockSource {
    pub history: BTreeMap<Symbol, Vec<Row>>,
    pub fail_login: bool,
    pub failing: HashSet<Symbol>,
    pub resolved_fields: Option<Vec<String>>,
    pub queries: RefCell<Vec<QueryRequest>>,
    pub logins: Cell<usize>,
    pub logouts: Cell<usize>,
}

impl MockSource {
    pub fn new() -> Self {
        Self {
            history: BTreeMap::new(),
            fail_login: false,
            failing: HashSet::new(),
            resolved_fields: None,
            queries: RefCell::new(Vec::new()),
            logins: Cell::new(0),
            logouts: Cell::new(0),
        }
    }

    pub fn with_history(mut self, symbol: &Symbol, days: &[NaiveDate]) -> Self {
        self.history
            .insert(symbol.clone(), days.iter().map(|d| row_for(*d)).collect());
        self
    }

    pub fn query_count(&self) -> usize {
        self.queries.borrow().len()
    }
}

impl DataSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    fn login(&self) -> Result<SessionHandle, DataError> {
        self.logins.set(self.logins.get() + 1);
        if self.fail_login {
            return Err(DataError::LoginFailed {
                code: "10002007".into(),
                message: "network error".into(),
            });
        }
        Ok(SessionHandle {
            token: "mock-session".into(),
        })
    }

    fn query<'a>(
        &'a self,
        session: &SessionHandle,
        request: &QueryRequest,
    ) -> Result<Box<dyn RowCursor + 'a>, DataError> {
        assert_eq!(session.token, "mock-session");
        assert!(request.start <= request.end, "inverted window sent to source");
        self.queries.borrow_mut().push(request.clone());

        if self.failing.contains(&request.symbol) {
            return Err(DataError::QueryFailed {
                symbol: request.symbol.to_string(),
                code: "10004011".into(),
                message: "query failed".into(),
            });
        }

        let start = request.start.format("%Y-%m-%d").to_string();
        let end = request.end.format("%Y-%m-%d").to_string();
        let rows: Vec<Row> = self
            .history
            .get(&request.symbol)
            .map(|rows| {
                rows.iter()
                    .filter(|r| r[0] >= start && r[0] <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let resolved = self
            .resolved_fields
            .clone()
            .unwrap_or_else(|| request.fields.clone());
        Ok(Box::new(VecCursor::new(resolved, rows)))
    }

    fn logout(&self, _session: SessionHandle) -> Result<(), DataError> {
        self.logouts.set(self.logouts.get() + 1);
        Ok(())
    }
}
