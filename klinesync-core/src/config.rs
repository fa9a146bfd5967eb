//! Run configuration.
//!
//! Stored as TOML; every key is optional. The one environment override is
//! `KLINESYNC_DATA_DIR`, which replaces `data_dir` after the file is read.

use crate::store::CorruptTailPolicy;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "KLINESYNC_DATA_DIR";

/// Column order of every record file. Appends are headerless and positional,
/// so this order must never change for existing files.
pub const DEFAULT_FIELDS: [&str; 8] = [
    "date",
    "open",
    "peTTM",
    "pbMRQ",
    "tradestatus",
    "close",
    "high",
    "low",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Remote source connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub user_id: String,
    pub password: String,
    /// Per-request timeout. The only bound on a stuck remote call.
    pub timeout_secs: u64,
    pub frequency: String,
    pub adjust_flag: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".into(),
            user_id: "anonymous".into(),
            password: "123456".into(),
            timeout_secs: 30,
            frequency: "d".into(),
            adjust_flag: "3".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Symbol list used by backfill, relative to `data_dir` unless absolute.
    pub list_file: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            list_file: PathBuf::from("stockList_index.csv"),
        }
    }
}

/// Complete configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub data_dir: PathBuf,
    /// First date fetched for a symbol with no stored history.
    pub default_start: NaiveDate,
    /// First date of a full backfill.
    pub backfill_start: NaiveDate,
    pub fields: Vec<String>,
    pub corrupt_tail: CorruptTailPolicy,
    pub source: SourceConfig,
    pub catalog: CatalogConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("Data"),
            default_start: NaiveDate::from_ymd_opt(2017, 4, 20).unwrap_or_default(),
            backfill_start: NaiveDate::from_ymd_opt(2014, 1, 1).unwrap_or_default(),
            fields: DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
            corrupt_tail: CorruptTailPolicy::default(),
            source: SourceConfig::default(),
            catalog: CatalogConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// File if given, defaults otherwise; then the environment override.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.fields.first() {
            None => Err(ConfigError::Invalid("fields must not be empty".into())),
            Some(first) if first != "date" => Err(ConfigError::Invalid(format!(
                "first field must be 'date', got '{first}'"
            ))),
            Some(_) if self.data_dir.as_os_str().is_empty() => {
                Err(ConfigError::Invalid("data_dir must not be empty".into()))
            }
            Some(_) => Ok(()),
        }
    }

    /// Name of the date column, used to recognize header rows.
    pub fn date_column(&self) -> &str {
        self.fields.first().map(String::as_str).unwrap_or("date")
    }

    /// Catalog list path, resolved against `data_dir`.
    pub fn list_file_path(&self) -> PathBuf {
        if self.catalog.list_file.is_absolute() {
            self.catalog.list_file.clone()
        } else {
            self.data_dir.join(&self.catalog.list_file)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = SyncConfig::from_toml("").unwrap();
        assert_eq!(config, SyncConfig::default());
        assert_eq!(config.fields.len(), 8);
        assert_eq!(config.default_start, NaiveDate::from_ymd_opt(2017, 4, 20).unwrap());
        assert_eq!(config.corrupt_tail, CorruptTailPolicy::Fail);
    }

    #[test]
    fn partial_toml_overrides() {
        let config = SyncConfig::from_toml(
            r#"
data_dir = "/srv/kline"
default_start = "2020-01-01"
corrupt_tail = "refetch"

[source]
base_url = "http://gateway:9000"
timeout_secs = 5
"#,
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/kline"));
        assert_eq!(config.corrupt_tail, CorruptTailPolicy::Refetch);
        assert_eq!(config.source.base_url, "http://gateway:9000");
        assert_eq!(config.source.timeout_secs, 5);
        assert_eq!(config.source.frequency, "d");
        assert_eq!(config.list_file_path(), PathBuf::from("/srv/kline/stockList_index.csv"));
    }

    #[test]
    fn rejects_fields_not_starting_with_date() {
        let err = SyncConfig::from_toml(r#"fields = ["open", "date"]"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = SyncConfig::from_toml("fields = []").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_bad_date() {
        let err = SyncConfig::from_toml(r#"default_start = "2020-13-01""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
