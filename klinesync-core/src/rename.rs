//! Legacy file-name classification.
//!
//! Older downloads were saved as `600000_ALL.csv` with no exchange prefix.
//! The exchange is recoverable from the code, so these files can be renamed
//! in place to `sh.600000_ALL.csv` and picked up by update runs.

use crate::store::StoreError;
use crate::symbol::Exchange;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// New name for a legacy record file, or `None` if it is not one.
pub fn classify_legacy_name(name: &str) -> Option<String> {
    let stem = name.strip_suffix(".csv")?;
    let code = stem.split('_').next().unwrap_or(stem);
    if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let exchange = Exchange::classify_code(code)?;
    Some(format!("{}.{name}", exchange.prefix()))
}

/// One planned or applied rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Rename every legacy record file in `dir`. With `dry_run`, only report.
///
/// An existing target is never overwritten; that file is skipped.
pub fn rename_legacy_files(dir: &Path, dry_run: bool) -> Result<Vec<Rename>, StoreError> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map_err(|e| StoreError::io(dir, e))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();

    let mut renames = Vec::new();
    for name in names {
        let Some(new_name) = classify_legacy_name(&name) else {
            continue;
        };
        let from = dir.join(&name);
        let to = dir.join(&new_name);
        if to.exists() {
            warn!(from = %name, to = %new_name, "target exists, skipping");
            continue;
        }
        if !dry_run {
            fs::rename(&from, &to).map_err(|e| StoreError::io(&from, e))?;
            info!(from = %name, to = %new_name, "renamed");
        }
        renames.push(Rename { from, to });
    }
    Ok(renames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_code_prefix() {
        assert_eq!(classify_legacy_name("600000_ALL.csv").as_deref(), Some("sh.600000_ALL.csv"));
        assert_eq!(classify_legacy_name("000001.csv").as_deref(), Some("sz.000001.csv"));
        assert_eq!(classify_legacy_name("300750_ALL.csv").as_deref(), Some("sz.300750_ALL.csv"));
    }

    #[test]
    fn ignores_prefixed_and_unrelated_names() {
        assert_eq!(classify_legacy_name("sh.600000_ALL.csv"), None);
        assert_eq!(classify_legacy_name("830799.csv"), None);
        assert_eq!(classify_legacy_name("stockList_index.csv"), None);
        assert_eq!(classify_legacy_name("600000_ALL.txt"), None);
    }

    #[test]
    fn renames_in_place_and_skips_existing_targets() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["600000_ALL.csv", "000001_ALL.csv", "sz.000001_ALL.csv", "readme.md"] {
            fs::write(dir.path().join(name), name).unwrap();
        }

        let renames = rename_legacy_files(dir.path(), false).unwrap();
        assert_eq!(renames.len(), 1);
        assert_eq!(renames[0].to, dir.path().join("sh.600000_ALL.csv"));
        assert!(dir.path().join("sh.600000_ALL.csv").exists());
        assert!(!dir.path().join("600000_ALL.csv").exists());
        // Target already existed: the legacy file stays put.
        assert!(dir.path().join("000001_ALL.csv").exists());
    }

    #[test]
    fn dry_run_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("600000_ALL.csv"), "").unwrap();

        let renames = rename_legacy_files(dir.path(), true).unwrap();
        assert_eq!(renames.len(), 1);
        assert!(dir.path().join("600000_ALL.csv").exists());
        assert!(!dir.path().join("sh.600000_ALL.csv").exists());
    }
}
