#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Time-series construction and latest-date summaries.
//!
//! [`builder::build_series`] turns the concatenated daily records of every
//! snapshot into one date-ordered [`LocationSeries`] per location with
//! day-over-day deltas. [`summary`] derives the latest-date location and
//! country totals, joined against the population table loaded by
//! [`population::load_population`].
//!
//! [`LocationSeries`]: covid_tracker_series_models::LocationSeries

pub mod builder;
pub mod population;
pub mod summary;

use std::path::PathBuf;

/// Errors that can occur while building series or summaries.
#[derive(Debug, thiserror::Error)]
pub enum SeriesError {
    /// I/O error reading a reference table.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error in {}: {source}", .file.display())]
    Csv {
        /// File being read.
        file: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// The population table lacks a required column.
    #[error("Population file {} has no {column} column (headers: {headers:?})", .file.display())]
    MissingColumn {
        /// Path of the population file.
        file: PathBuf,
        /// Column that could not be located.
        column: &'static str,
        /// Headers that were present.
        headers: Vec<String>,
    },

    /// A population cell is not a non-negative integer.
    #[error("Invalid population {value:?} for {country:?} in {} line {line}", .file.display())]
    InvalidPopulation {
        /// Path of the population file.
        file: PathBuf,
        /// 1-based line number.
        line: u64,
        /// Country the value belongs to.
        country: String,
        /// Offending cell text.
        value: String,
    },
}
