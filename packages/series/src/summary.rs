//! Latest-date location and country summaries.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use covid_tracker_location_models::{Location, LocationId};
use covid_tracker_series_models::{CountrySummary, LocationSeries, LocationSummary, rate};

use crate::population::PopulationTable;

/// The maximum date present across every series.
#[must_use]
pub fn latest_date(series: &[LocationSeries]) -> Option<NaiveDate> {
    series
        .iter()
        .filter_map(|s| s.latest().map(|e| e.date))
        .max()
}

/// Totals for every location that reported on the latest date.
///
/// Locations with no record on that date are left out. Sorted by
/// descending confirmed count, then identity.
#[must_use]
pub fn location_summaries(series: &[LocationSeries]) -> Vec<LocationSummary> {
    let Some(date) = latest_date(series) else {
        return Vec::new();
    };

    let mut summaries: Vec<LocationSummary> = series
        .iter()
        .filter_map(|s| {
            let entry = s.latest().filter(|e| e.date == date)?;
            Some(LocationSummary {
                location_id: s.location_id.clone(),
                country_region: s.country_region.clone(),
                province_state: s.province_state.clone(),
                date,
                confirmed: entry.confirmed,
                deaths: entry.deaths,
                recovered: entry.recovered,
                death_rate: rate(entry.deaths, entry.confirmed),
                recovery_rate: rate(entry.recovered, entry.confirmed),
            })
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.confirmed
            .cmp(&a.confirmed)
            .then_with(|| a.location_id.cmp(&b.location_id))
    });
    log::info!("Summarized {} locations as of {date}", summaries.len());
    summaries
}

#[derive(Default)]
struct CountryTotals {
    confirmed: u64,
    deaths: u64,
    recovered: u64,
}

/// Per-country totals for the latest date.
///
/// The location table and the location summaries are joined on identity
/// with full-outer semantics: a location only in the table contributes
/// zeros under its table country, and a summarized location missing from
/// the table still counts under its own country. Rates are recomputed from
/// the summed totals. Population is looked up in `population`; countries
/// it lacks keep a `None` population. Sorted by country name.
#[must_use]
pub fn country_summaries(
    locations: &[Location],
    summaries: &[LocationSummary],
    population: &PopulationTable,
) -> Vec<CountrySummary> {
    let by_id: HashMap<&LocationId, &LocationSummary> =
        summaries.iter().map(|s| (&s.location_id, s)).collect();

    let mut countries: BTreeMap<&str, CountryTotals> = BTreeMap::new();

    for location in locations {
        match by_id.get(&location.location_id).copied() {
            Some(summary) => add(&mut countries, summary),
            None => {
                countries
                    .entry(location.country_region.as_str())
                    .or_default();
            }
        }
    }

    let known: HashSet<&LocationId> =
        locations.iter().map(|l| &l.location_id).collect();
    let mut unlisted = 0_usize;
    for summary in summaries.iter().filter(|s| !known.contains(&s.location_id)) {
        add(&mut countries, summary);
        unlisted += 1;
    }
    if unlisted > 0 {
        log::debug!("{unlisted} summarized locations are not in the location table");
    }

    countries
        .into_iter()
        .map(|(country, totals)| {
            let population = population.get(country);
            if population.is_none() {
                log::debug!("No population for {country:?}");
            }
            CountrySummary {
                country_region: country.to_string(),
                confirmed: totals.confirmed,
                deaths: totals.deaths,
                recovered: totals.recovered,
                death_rate: rate(totals.deaths, totals.confirmed),
                recovery_rate: rate(totals.recovered, totals.confirmed),
                population,
            }
        })
        .collect()
}

fn add<'a>(countries: &mut BTreeMap<&'a str, CountryTotals>, summary: &'a LocationSummary) {
    let totals = countries
        .entry(summary.country_region.as_str())
        .or_default();
    totals.confirmed = totals.confirmed.saturating_add(summary.confirmed);
    totals.deaths = totals.deaths.saturating_add(summary.deaths);
    totals.recovered = totals.recovered.saturating_add(summary.recovered);
}
