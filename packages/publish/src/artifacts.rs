//! Local artifact writers.
//!
//! Layout under the output directory:
//!
//! | Path | Contents |
//! |---|---|
//! | `location_case_data/{location_id}.json` | one location's series |
//! | `locations.json`, `locations.csv` | the master location index |
//! | `summary/locations.json` | latest-date location totals |
//! | `summary/countries.json` | latest-date country totals |
//!
//! Every file is written to a `.tmp` sibling and renamed into place.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use covid_tracker_location::index::artifact_name;
use covid_tracker_location_models::LocationIndexEntry;
use covid_tracker_series_models::{CountrySummary, LocationSeries, LocationSummary, SeriesEntry};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::PublishError;

/// Directory (under the output directory) holding per-location series.
pub const SERIES_DIR: &str = "location_case_data";

/// Object name of the location index.
pub const INDEX_JSON: &str = "locations.json";

/// File name of the flat copy of the location index.
pub const INDEX_CSV: &str = "locations.csv";

/// Directory (under the output directory) holding the summaries.
pub const SUMMARY_DIR: &str = "summary";

/// Paths of the summary files written by [`write_summaries`].
#[derive(Debug, Clone)]
pub struct SummaryPaths {
    /// `summary/locations.json`.
    pub locations: PathBuf,
    /// `summary/countries.json`.
    pub countries: PathBuf,
}

/// Writes one location's series to `location_case_data/{id}.json`.
///
/// # Errors
///
/// Returns [`PublishError::Io`] or [`PublishError::Json`] if the file
/// cannot be written.
pub fn write_location_series(
    output_dir: &Path,
    series: &LocationSeries,
) -> Result<PathBuf, PublishError> {
    let path = output_dir
        .join(SERIES_DIR)
        .join(artifact_name(&series.location_id));
    write_json(&path, &series.entries)?;
    Ok(path)
}

/// Reads back a per-location series artifact.
///
/// # Errors
///
/// Returns [`PublishError::Io`] if the file cannot be read or
/// [`PublishError::Json`] if it is not a series.
pub fn read_location_series(path: &Path) -> Result<Vec<SeriesEntry>, PublishError> {
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|source| PublishError::Json {
        file: path.to_path_buf(),
        source,
    })
}

/// Writes the location index as `locations.json` and `locations.csv`.
///
/// Returns the path of the JSON file (the one that is published).
///
/// # Errors
///
/// Returns a [`PublishError`] if either file cannot be written.
pub fn write_location_index(
    output_dir: &Path,
    index: &[LocationIndexEntry],
) -> Result<PathBuf, PublishError> {
    let json_path = output_dir.join(INDEX_JSON);
    write_json(&json_path, index)?;

    let csv_path = output_dir.join(INDEX_CSV);
    write_atomic(&csv_path, |file| {
        let csv_err = |source| PublishError::Csv {
            file: csv_path.clone(),
            source,
        };
        let mut writer = csv::Writer::from_writer(file);
        for entry in index {
            writer.serialize(entry).map_err(csv_err)?;
        }
        writer.flush()?;
        Ok(())
    })?;

    log::debug!(
        "Wrote {} index entries to {} and {}",
        index.len(),
        json_path.display(),
        csv_path.display()
    );
    Ok(json_path)
}

/// Writes the latest-date summaries under `summary/`.
///
/// # Errors
///
/// Returns a [`PublishError`] if either file cannot be written.
pub fn write_summaries(
    output_dir: &Path,
    locations: &[LocationSummary],
    countries: &[CountrySummary],
) -> Result<SummaryPaths, PublishError> {
    let dir = output_dir.join(SUMMARY_DIR);
    let paths = SummaryPaths {
        locations: dir.join("locations.json"),
        countries: dir.join("countries.json"),
    };
    write_json(&paths.locations, locations)?;
    write_json(&paths.countries, countries)?;
    Ok(paths)
}

/// Serializes `value` as JSON with a 4-space indent.
///
/// # Errors
///
/// Returns [`PublishError::Io`] or [`PublishError::Json`].
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PublishError> {
    write_atomic(path, |file| {
        let mut writer = BufWriter::new(file);
        let mut ser =
            serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
        value
            .serialize(&mut ser)
            .map_err(|source| PublishError::Json {
                file: path.to_path_buf(),
                source,
            })?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    })
}

/// Runs `write` against a `.tmp` sibling of `path`, then renames it over
/// `path`. The temporary file is removed if `write` fails.
fn write_atomic<F>(path: &Path, write: F) -> Result<(), PublishError>
where
    F: FnOnce(&mut File) -> Result<(), PublishError>,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    let result = File::create(&tmp)
        .map_err(PublishError::from)
        .and_then(|mut file| {
            write(&mut file)?;
            file.sync_all()?;
            Ok(())
        });

    if let Err(e) = result {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }

    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use covid_tracker_location_models::LocationId;

    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn entry(day: u32, confirmed: u64, daily: Option<i64>) -> SeriesEntry {
        SeriesEntry {
            date: NaiveDate::from_ymd_opt(2020, 3, day).unwrap(),
            country_region: "US".to_string(),
            province_state: "Washington".to_string(),
            location_id: LocationId::from_slug("us-washington".to_string()),
            confirmed,
            deaths: 1,
            recovered: 0,
            daily_confirmed: daily,
            daily_deaths: Some(0),
            daily_recovered: Some(0),
        }
    }

    #[test]
    fn series_round_trips_through_the_artifact() {
        let dir = scratch("covid_tracker_artifacts_series");
        let series = LocationSeries {
            location_id: LocationId::from_slug("us-washington".to_string()),
            country_region: "US".to_string(),
            province_state: "Washington".to_string(),
            entries: vec![entry(1, 10, Some(10)), entry(2, 10, Some(0)), entry(4, 15, None)],
        };

        let path = write_location_series(&dir, &series).unwrap();
        assert_eq!(path, dir.join("location_case_data").join("us-washington.json"));
        assert_eq!(read_location_series(&path).unwrap(), series.entries);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n    {\n        \"date\": \"2020-03-01\""));
        assert!(!path.with_file_name("us-washington.json.tmp").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn index_is_written_as_json_and_csv() {
        let dir = scratch("covid_tracker_artifacts_index");
        let index = vec![LocationIndexEntry {
            country_region: "Italy".to_string(),
            province_state: String::new(),
            lat: Some(43.0),
            long: None,
            location_id: LocationId::from_slug("italy".to_string()),
            cloud_resource: "https://b.s3.amazonaws.com/italy.json".to_string(),
        }];

        let json_path = write_location_index(&dir, &index).unwrap();
        let parsed: Vec<LocationIndexEntry> =
            serde_json::from_slice(&std::fs::read(&json_path).unwrap()).unwrap();
        assert_eq!(parsed, index);

        let csv_text = std::fs::read_to_string(dir.join(INDEX_CSV)).unwrap();
        assert_eq!(
            csv_text,
            "country_region,province_state,lat,long,location_id,cloud_resource\n\
             Italy,,43.0,,italy,https://b.s3.amazonaws.com/italy.json\n"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn nan_summary_rates_are_written_as_null() {
        let dir = scratch("covid_tracker_artifacts_summary");
        let countries = vec![CountrySummary {
            country_region: "Nowhere".to_string(),
            confirmed: 0,
            deaths: 0,
            recovered: 0,
            death_rate: f64::NAN,
            recovery_rate: f64::NAN,
            population: None,
        }];

        let paths = write_summaries(&dir, &[], &countries).unwrap();
        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&paths.countries).unwrap()).unwrap();
        assert!(value[0]["death_rate"].is_null());
        assert!(value[0]["population"].is_null());
        assert_eq!(std::fs::read_to_string(&paths.locations).unwrap(), "[]\n");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
