#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Location time-series and latest-date summary types.
//!
//! A [`LocationSeries`] is the date-ordered history of one location with
//! day-over-day deltas. [`LocationSummary`] and [`CountrySummary`] are the
//! latest-date totals with derived percentage rates.

use chrono::NaiveDate;
use covid_tracker_location_models::LocationId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

/// How daily deltas are computed when a location is missing dates.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GapPolicy {
    /// Delta against the immediately preceding present record, however
    /// many days earlier it is.
    #[default]
    LastSeen,
    /// `null` deltas when the preceding present record is not exactly one
    /// calendar day earlier.
    NullAcrossGap,
}

/// One day of one location's series.
///
/// Field order is the serialized field order of the per-location artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesEntry {
    /// Snapshot date, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    /// Country or region name.
    pub country_region: String,
    /// Province or state name, empty for whole-country locations.
    pub province_state: String,
    /// Location identity.
    pub location_id: LocationId,
    /// Cumulative confirmed cases.
    pub confirmed: u64,
    /// Cumulative deaths.
    pub deaths: u64,
    /// Cumulative recoveries.
    pub recovered: u64,
    /// Confirmed cases since the previous present record. Negative when
    /// the source corrected its cumulative count downwards.
    pub daily_confirmed: Option<i64>,
    /// Deaths since the previous present record.
    pub daily_deaths: Option<i64>,
    /// Recoveries since the previous present record.
    pub daily_recovered: Option<i64>,
}

/// The full date-ordered history of one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationSeries {
    /// Location identity.
    pub location_id: LocationId,
    /// Country or region name (first spelling seen for this identity).
    pub country_region: String,
    /// Province or state name (first spelling seen for this identity).
    pub province_state: String,
    /// Entries in ascending date order, at most one per date.
    pub entries: Vec<SeriesEntry>,
}

impl LocationSeries {
    /// The most recent entry, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&SeriesEntry> {
        self.entries.last()
    }
}

/// Latest-date totals for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSummary {
    /// Location identity.
    pub location_id: LocationId,
    /// Country or region name.
    pub country_region: String,
    /// Province or state name.
    pub province_state: String,
    /// The latest date across the whole series.
    pub date: NaiveDate,
    /// Cumulative confirmed cases.
    pub confirmed: u64,
    /// Cumulative deaths.
    pub deaths: u64,
    /// Cumulative recoveries.
    pub recovered: u64,
    /// `deaths / confirmed * 100`, NaN (`null` on the wire) when
    /// `confirmed` is zero.
    #[serde(serialize_with = "serialize_rate", deserialize_with = "deserialize_rate")]
    pub death_rate: f64,
    /// `recovered / confirmed * 100`, NaN (`null` on the wire) when
    /// `confirmed` is zero.
    #[serde(serialize_with = "serialize_rate", deserialize_with = "deserialize_rate")]
    pub recovery_rate: f64,
}

/// Latest-date totals for one country/region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountrySummary {
    /// Country or region name.
    pub country_region: String,
    /// Summed confirmed cases.
    pub confirmed: u64,
    /// Summed deaths.
    pub deaths: u64,
    /// Summed recoveries.
    pub recovered: u64,
    /// Recomputed from the summed totals.
    #[serde(serialize_with = "serialize_rate", deserialize_with = "deserialize_rate")]
    pub death_rate: f64,
    /// Recomputed from the summed totals.
    #[serde(serialize_with = "serialize_rate", deserialize_with = "deserialize_rate")]
    pub recovery_rate: f64,
    /// Population from the reference table, `None` when the country is
    /// absent from it.
    pub population: Option<u64>,
}

/// `part / whole * 100`, or NaN when `whole` is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rate(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        f64::NAN
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_rate<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_some(value)
    } else {
        serializer.serialize_none()
    }
}

fn deserialize_rate<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(confirmed: u64, deaths: u64) -> LocationSummary {
        LocationSummary {
            location_id: LocationId::from_slug("italy".to_string()),
            country_region: "Italy".to_string(),
            province_state: String::new(),
            date: NaiveDate::from_ymd_opt(2020, 3, 22).unwrap(),
            confirmed,
            deaths,
            recovered: 0,
            death_rate: rate(deaths, confirmed),
            recovery_rate: rate(0, confirmed),
        }
    }

    #[test]
    fn rate_is_a_percentage() {
        assert!((rate(1, 4) - 25.0).abs() < f64::EPSILON);
        assert!(rate(0, 0).is_nan());
        assert!(rate(3, 0).is_nan());
    }

    #[test]
    fn nan_rates_serialize_as_null() {
        let json = serde_json::to_value(summary(0, 0)).unwrap();
        assert!(json["death_rate"].is_null());
        assert!(json["recovery_rate"].is_null());

        let json = serde_json::to_value(summary(10, 1)).unwrap();
        assert!((json["death_rate"].as_f64().unwrap() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn null_rate_parses_back_as_nan() {
        let json = serde_json::to_string(&summary(0, 0)).unwrap();
        let parsed: LocationSummary = serde_json::from_str(&json).unwrap();
        assert!(parsed.death_rate.is_nan());
    }

    #[test]
    fn series_entry_date_is_iso_formatted() {
        let entry = SeriesEntry {
            date: NaiveDate::from_ymd_opt(2020, 1, 22).unwrap(),
            country_region: "US".to_string(),
            province_state: String::new(),
            location_id: LocationId::from_slug("us".to_string()),
            confirmed: 1,
            deaths: 0,
            recovered: 0,
            daily_confirmed: Some(1),
            daily_deaths: Some(0),
            daily_recovered: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["date"], "2020-01-22");
        assert!(json["daily_recovered"].is_null());
    }

    #[test]
    fn gap_policy_parses_from_config_spelling() {
        assert_eq!("last_seen".parse::<GapPolicy>().unwrap(), GapPolicy::LastSeen);
        assert_eq!(
            "null_across_gap".parse::<GapPolicy>().unwrap(),
            GapPolicy::NullAcrossGap
        );
        assert_eq!(GapPolicy::default().to_string(), "last_seen");
    }
}
