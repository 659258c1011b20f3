//! Time-series builder.
//!
//! Sorts the concatenated daily records by `(country_region,
//! province_state, date)`, groups them by location identity and computes
//! per-metric daily deltas against an implicit zero baseline.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use chrono::NaiveDate;
use covid_tracker_location::identity::resolve;
use covid_tracker_location_models::LocationId;
use covid_tracker_series_models::{GapPolicy, LocationSeries, SeriesEntry};
use covid_tracker_snapshot_models::DailyRecord;

/// Cumulative `(confirmed, deaths, recovered)` for one date.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Totals {
    confirmed: u64,
    deaths: u64,
    recovered: u64,
}

impl Totals {
    const fn of(record: &DailyRecord) -> Self {
        Self {
            confirmed: record.total_confirmed,
            deaths: record.total_deaths,
            recovered: record.total_recovered,
        }
    }

    const fn merge(&mut self, other: Self) {
        self.confirmed = self.confirmed.saturating_add(other.confirmed);
        self.deaths = self.deaths.saturating_add(other.deaths);
        self.recovered = self.recovered.saturating_add(other.recovered);
    }
}

/// Records collected for one identity before deltas are computed.
struct Group {
    location_id: LocationId,
    country_region: String,
    province_state: String,
    by_date: BTreeMap<NaiveDate, Totals>,
}

/// Builds one [`LocationSeries`] per location from every daily record.
///
/// Records whose region names differ only in case or whitespace resolve
/// to the same identity and are merged; if two of them land on the same
/// date their counts are summed. Each series keeps the first spelling seen
/// in sorted order. Series are returned in `(country_region,
/// province_state)` order.
#[must_use]
pub fn build_series(records: &[DailyRecord], policy: GapPolicy) -> Vec<LocationSeries> {
    let start = Instant::now();

    let mut sorted: Vec<&DailyRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        (&a.country_region, &a.province_state, a.date).cmp(&(
            &b.country_region,
            &b.province_state,
            b.date,
        ))
    });

    let mut groups: Vec<Group> = Vec::new();
    let mut positions: HashMap<LocationId, usize> = HashMap::new();

    for record in sorted {
        let location_id = resolve(&record.country_region, &record.province_state);
        let index = *positions.entry(location_id.clone()).or_insert_with(|| {
            groups.push(Group {
                location_id,
                country_region: record.country_region.trim().to_string(),
                province_state: record.province_state.trim().to_string(),
                by_date: BTreeMap::new(),
            });
            groups.len() - 1
        });

        groups[index]
            .by_date
            .entry(record.date)
            .or_default()
            .merge(Totals::of(record));
    }

    let series: Vec<LocationSeries> = groups
        .into_iter()
        .map(|group| series_for(group, policy))
        .collect();

    log::info!(
        "Built {} location series from {} daily records ({policy}) in {:.1?}",
        series.len(),
        records.len(),
        start.elapsed(),
    );
    series
}

fn series_for(group: Group, policy: GapPolicy) -> LocationSeries {
    let mut previous: Option<(NaiveDate, Totals)> = None;
    let mut entries = Vec::with_capacity(group.by_date.len());

    for (date, totals) in group.by_date {
        let baseline = match previous {
            None => Some(Totals::default()),
            Some((prev_date, prev)) => {
                if policy == GapPolicy::NullAcrossGap && prev_date.succ_opt() != Some(date) {
                    log::trace!("{}: gap before {date}, deltas are null", group.location_id);
                    None
                } else {
                    Some(prev)
                }
            }
        };

        entries.push(SeriesEntry {
            date,
            country_region: group.country_region.clone(),
            province_state: group.province_state.clone(),
            location_id: group.location_id.clone(),
            confirmed: totals.confirmed,
            deaths: totals.deaths,
            recovered: totals.recovered,
            daily_confirmed: baseline.map(|b| calc_differential(totals.confirmed, b.confirmed)),
            daily_deaths: baseline.map(|b| calc_differential(totals.deaths, b.deaths)),
            daily_recovered: baseline.map(|b| calc_differential(totals.recovered, b.recovered)),
        });
        previous = Some((date, totals));
    }

    LocationSeries {
        location_id: group.location_id,
        country_region: group.country_region,
        province_state: group.province_state,
        entries,
    }
}

/// Signed difference `current - previous`, saturating at the `i64` range.
#[must_use]
pub fn calc_differential(current: u64, previous: u64) -> i64 {
    let diff = i128::from(current) - i128::from(previous);
    i64::try_from(diff).unwrap_or(if diff > 0 { i64::MAX } else { i64::MIN })
}
