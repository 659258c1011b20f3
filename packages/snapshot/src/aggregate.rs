//! Daily snapshot aggregation.
//!
//! Collapses every normalized row of one snapshot into one [`DailyRecord`]
//! per `(country_region, province_state)`, summing counts. This is where
//! county-level (`Admin2`) rows fold back into their state.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use covid_tracker_snapshot_models::{DailyRecord, NormalizedRow};

use crate::SnapshotError;
use crate::discover::SnapshotFile;
use crate::normalize::read_snapshot;
use crate::progress::ProgressCallback;
use crate::schema_def::SchemaVariant;

/// Sums `rows` into one record per `(country_region, province_state)`,
/// stamped with `date`.
///
/// Records are ordered by country/region, then province/state.
#[must_use]
pub fn aggregate_rows(date: NaiveDate, rows: &[NormalizedRow]) -> Vec<DailyRecord> {
    let mut grouped: BTreeMap<(&str, &str), DailyRecord> = BTreeMap::new();

    for row in rows {
        grouped
            .entry((row.country_region.as_str(), row.province_state.as_str()))
            .or_insert_with(|| {
                DailyRecord::empty(row.country_region.clone(), row.province_state.clone(), date)
            })
            .add(row);
    }

    grouped.into_values().collect()
}

/// Loads, normalizes and aggregates a single snapshot.
///
/// # Errors
///
/// Propagates any [`SnapshotError`] from reading or normalizing the file.
pub fn load_day(
    snapshot: &SnapshotFile,
    schemas: &[SchemaVariant],
) -> Result<Vec<DailyRecord>, SnapshotError> {
    let rows = read_snapshot(snapshot, schemas)?;
    let records = aggregate_rows(snapshot.date, &rows);

    log::debug!(
        "{} ({}): {} rows -> {} records",
        snapshot.path.display(),
        snapshot.date,
        rows.len(),
        records.len(),
    );
    Ok(records)
}

/// Loads every snapshot and concatenates the per-day records.
///
/// Stops at the first failing snapshot; no partial result is returned and
/// the progress display is cleared.
///
/// # Errors
///
/// Returns the first [`SnapshotError`] encountered.
pub fn load_all(
    snapshots: &[SnapshotFile],
    schemas: &[SchemaVariant],
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Vec<DailyRecord>, SnapshotError> {
    let start = Instant::now();
    progress.set_total(snapshots.len() as u64);

    let mut records = Vec::new();
    for snapshot in snapshots {
        progress.set_message(format!("Loading {}", snapshot.date));
        match load_day(snapshot, schemas) {
            Ok(day) => records.extend(day),
            Err(e) => {
                progress.finish_and_clear();
                return Err(e);
            }
        }
        progress.inc(1);
    }

    progress.finish(format!("Loaded {} snapshots", snapshots.len()));
    log::info!(
        "Loaded {} daily records from {} snapshots in {:.1?}",
        records.len(),
        snapshots.len(),
        start.elapsed(),
    );
    Ok(records)
}
