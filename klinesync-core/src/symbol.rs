//! Symbol identifiers: exchange prefix + numeric code.
//!
//! Two spellings circulate: the source form `sh.600000` (used in queries and
//! file names) and the list form `600000.sh` (used by catalog list files).
//! Both parse to the same [`Symbol`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Exchange a symbol trades on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Exchange {
    /// Shanghai.
    Sh,
    /// Shenzhen.
    Sz,
}

impl Exchange {
    /// Lowercase prefix used in file names and queries.
    pub fn prefix(self) -> &'static str {
        match self {
            Exchange::Sh => "sh",
            Exchange::Sz => "sz",
        }
    }

    /// Infer the exchange from a bare numeric code.
    ///
    /// `60xxxx` listings are Shanghai; `00xxxx` and `30xxxx` are Shenzhen.
    pub fn classify_code(code: &str) -> Option<Exchange> {
        if code.starts_with("60") {
            Some(Exchange::Sh)
        } else if code.starts_with("00") || code.starts_with("30") {
            Some(Exchange::Sz)
        } else {
            None
        }
    }

    fn from_prefix(prefix: &str) -> Option<Exchange> {
        match prefix.to_ascii_lowercase().as_str() {
            "sh" => Some(Exchange::Sh),
            "sz" => Some(Exchange::Sz),
            _ => None,
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Naming convention of a record file, one per run mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Full-history download: `sh.600000_ALL.csv`.
    Backfill,
    /// Incremental update: `sh.600000.csv`.
    Update,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SymbolError {
    #[error("invalid symbol '{0}': expected 'sh.600000' or '600000.sh'")]
    Malformed(String),

    #[error("invalid symbol '{input}': code '{code}' is not numeric")]
    NonNumericCode { input: String, code: String },
}

/// A tradable instrument identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol {
    pub exchange: Exchange,
    pub code: String,
}

impl Symbol {
    pub fn new(exchange: Exchange, code: impl Into<String>) -> Self {
        Self {
            exchange,
            code: code.into(),
        }
    }

    /// Parse either `sh.600000` or `600000.sh`.
    pub fn parse(input: &str) -> Result<Self, SymbolError> {
        let trimmed = input.trim();
        let (left, right) = trimmed
            .split_once('.')
            .ok_or_else(|| SymbolError::Malformed(input.to_string()))?;

        let (exchange, code) = if let Some(ex) = Exchange::from_prefix(left) {
            (ex, right)
        } else if let Some(ex) = Exchange::from_prefix(right) {
            (ex, left)
        } else {
            return Err(SymbolError::Malformed(input.to_string()));
        };

        if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SymbolError::NonNumericCode {
                input: input.to_string(),
                code: code.to_string(),
            });
        }

        Ok(Self::new(exchange, code))
    }

    /// Record file name for the given run mode.
    pub fn file_name(&self, mode: RunMode) -> String {
        match mode {
            RunMode::Backfill => format!("{self}_ALL.csv"),
            RunMode::Update => format!("{self}.csv"),
        }
    }

    /// Recover the symbol from a record file name of either convention.
    pub fn from_file_name(name: &str) -> Result<Self, SymbolError> {
        let stem = name.strip_suffix(".csv").unwrap_or(name);
        let stem = stem.split('_').next().unwrap_or(stem);
        Self::parse(stem)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.exchange, self.code)
    }
}

impl FromStr for Symbol {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
