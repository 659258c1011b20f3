#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Daily snapshot discovery, schema normalization, and aggregation.
//!
//! Each snapshot file carries one day of cumulative per-location counts in
//! one of several historical column layouts. The layouts are described by
//! config-driven [`schema_def::SchemaVariant`]s embedded in the
//! [`registry`]; a snapshot is matched to its variant by header, normalized
//! row by row, and collapsed into one [`DailyRecord`] per
//! `(country_region, province_state)` by [`aggregate`].
//!
//! [`DailyRecord`]: covid_tracker_snapshot_models::DailyRecord

pub mod aggregate;
pub mod discover;
pub mod normalize;
pub mod parsing;
pub mod progress;
pub mod registry;
pub mod schema_def;

use std::path::PathBuf;

use chrono::NaiveDate;

/// Errors that can occur while reading and normalizing snapshots.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// I/O error (file read, directory listing).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error in {}: {source}", .file.display())]
    Csv {
        /// Snapshot file being read.
        file: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// No known schema variant matches the snapshot's headers.
    #[error(
        "Unrecognized snapshot schema in {} (date {date}): headers {headers:?}",
        .file.display()
    )]
    UnrecognizedSchema {
        /// Snapshot file being read.
        file: PathBuf,
        /// Date of the snapshot.
        date: NaiveDate,
        /// Headers that were present.
        headers: Vec<String>,
    },

    /// A schema variant matched, but a canonical field's column is absent.
    #[error(
        "Snapshot {} (date {date}, schema {schema}) has no column {column:?} for {field}",
        .file.display()
    )]
    MissingColumn {
        /// Snapshot file being read.
        file: PathBuf,
        /// Date of the snapshot.
        date: NaiveDate,
        /// Identifier of the matched schema variant.
        schema: String,
        /// Canonical field that could not be produced.
        field: &'static str,
        /// Source column the variant maps that field from.
        column: String,
    },

    /// A count cell is neither empty nor a non-negative whole number.
    #[error(
        "Invalid count {value:?} in {} line {line}, column {column:?}",
        .file.display()
    )]
    InvalidCount {
        /// Snapshot file being read.
        file: PathBuf,
        /// 1-based line number of the row.
        line: u64,
        /// Source column name.
        column: String,
        /// Raw cell contents.
        value: String,
    },

    /// A snapshot file name does not carry a date in the configured format.
    #[error("Snapshot file name {} does not match date format {format:?}", .file.display())]
    InvalidFileName {
        /// Offending file.
        file: PathBuf,
        /// Expected `chrono` format string.
        format: String,
    },

    /// Two snapshot files map to the same calendar date.
    #[error("Snapshots {} and {} both carry date {date}", .first.display(), .second.display())]
    DuplicateDate {
        /// Date carried by both files.
        date: NaiveDate,
        /// First file seen for the date.
        first: PathBuf,
        /// Second file seen for the date.
        second: PathBuf,
    },

    /// An embedded schema variant failed to parse.
    #[error("Invalid schema variant {name}: {message}")]
    Registry {
        /// Registry entry name.
        name: String,
        /// Parse error.
        message: String,
    },
}
