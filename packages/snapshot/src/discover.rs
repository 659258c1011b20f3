//! Snapshot file discovery.
//!
//! A snapshot directory holds one CSV per calendar date, named by that
//! date (JHU uses `MM-DD-YYYY.csv`). Anything that is not a CSV file is
//! ignored.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::SnapshotError;

/// Default `chrono` format of the date carried in snapshot file names.
pub const DEFAULT_DATE_FORMAT: &str = "%m-%d-%Y";

/// A snapshot file and the date it reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    /// Path of the CSV file.
    pub path: PathBuf,
    /// Calendar date parsed from the file name.
    pub date: NaiveDate,
}

/// Lists the snapshots in `dir`, ordered by date.
///
/// # Errors
///
/// Returns [`SnapshotError::InvalidFileName`] if a CSV file's stem is not a
/// date in `date_format`, [`SnapshotError::DuplicateDate`] if two files
/// carry the same date, or an I/O error if the directory cannot be read.
pub fn discover_snapshots(dir: &Path, date_format: &str) -> Result<Vec<SnapshotFile>, SnapshotError> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if is_csv(&path) {
            paths.push(path);
        } else {
            log::debug!("Skipping non-snapshot file {}", path.display());
        }
    }
    paths.sort();

    let mut by_date: BTreeMap<NaiveDate, PathBuf> = BTreeMap::new();
    for path in paths {
        let date = snapshot_date(&path, date_format)?;
        if let Some(first) = by_date.get(&date) {
            return Err(SnapshotError::DuplicateDate {
                date,
                first: first.clone(),
                second: path,
            });
        }
        by_date.insert(date, path);
    }

    log::info!("Found {} snapshots in {}", by_date.len(), dir.display());
    Ok(by_date
        .into_iter()
        .map(|(date, path)| SnapshotFile { path, date })
        .collect())
}

/// Parses the date carried in a snapshot file's stem.
///
/// # Errors
///
/// Returns [`SnapshotError::InvalidFileName`] if the stem is not a date in
/// `date_format`.
pub fn snapshot_date(path: &Path, date_format: &str) -> Result<NaiveDate, SnapshotError> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| NaiveDate::parse_from_str(stem.trim(), date_format).ok())
        .ok_or_else(|| SnapshotError::InvalidFileName {
            file: path.to_path_buf(),
            format: date_format.to_string(),
        })
}

/// Returns `true` for paths with a `.csv` extension (any case).
fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}
