#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Location identity resolution and the master location index.
//!
//! The reference file (the wide confirmed-cases time series) is read once
//! to produce the immutable [`Location`] table. Each location is keyed by
//! the slug produced by [`identity::resolve`], and the published index
//! embeds a URL computed by [`index::cloud_resource_url`].
//!
//! [`Location`]: covid_tracker_location_models::Location

pub mod identity;
pub mod index;
pub mod reference;

use std::path::PathBuf;

/// Errors that can occur while loading or indexing locations.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    /// I/O error reading the reference file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The reference file lacks a column the location table needs.
    #[error("Reference file {} has no {field} column (headers: {headers:?})", .file.display())]
    MissingColumn {
        /// Path of the reference file.
        file: PathBuf,
        /// Canonical field that could not be located.
        field: &'static str,
        /// Headers that were present.
        headers: Vec<String>,
    },
}
