#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical snapshot row and daily record types.
//!
//! Every daily snapshot, whatever its source column layout, is normalized
//! into [`NormalizedRow`] values. Rows sharing a `(country_region,
//! province_state)` key on one date are then summed into a single
//! [`DailyRecord`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One raw snapshot row mapped onto the canonical field names.
///
/// Text fields are trimmed; missing counts are already zero-filled and a
/// missing province is the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRow {
    /// Country or region name.
    pub country_region: String,
    /// Province or state name, empty for whole-country rows.
    pub province_state: String,
    /// Finer-grained subdivision (e.g. a US county), when the snapshot
    /// schema carries one. Never part of a location's identity.
    pub sub_location: Option<String>,
    /// Cumulative confirmed cases.
    pub total_confirmed: u64,
    /// Cumulative deaths.
    pub total_deaths: u64,
    /// Cumulative recoveries.
    pub total_recovered: u64,
}

/// Cumulative counts for one `(country_region, province_state)` on one
/// calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// Country or region name.
    pub country_region: String,
    /// Province or state name, empty for whole-country records.
    pub province_state: String,
    /// Snapshot date.
    pub date: NaiveDate,
    /// Cumulative confirmed cases.
    pub total_confirmed: u64,
    /// Cumulative deaths.
    pub total_deaths: u64,
    /// Cumulative recoveries.
    pub total_recovered: u64,
}

impl DailyRecord {
    /// Creates an all-zero record for a location on `date`.
    #[must_use]
    pub const fn empty(country_region: String, province_state: String, date: NaiveDate) -> Self {
        Self {
            country_region,
            province_state,
            date,
            total_confirmed: 0,
            total_deaths: 0,
            total_recovered: 0,
        }
    }

    /// Adds a normalized row's counts into this record, saturating at
    /// `u64::MAX`.
    pub const fn add(&mut self, row: &NormalizedRow) {
        self.total_confirmed = self.total_confirmed.saturating_add(row.total_confirmed);
        self.total_deaths = self.total_deaths.saturating_add(row.total_deaths);
        self.total_recovered = self.total_recovered.saturating_add(row.total_recovered);
    }
}
