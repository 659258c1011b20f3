//! Schema normalization of raw snapshot rows.
//!
//! Matches a snapshot to its [`SchemaVariant`] by header and maps every row
//! onto [`NormalizedRow`]. An unrecognized layout, or a recognized layout
//! missing a mapped column, is a hard error: silently zero-filling a whole
//! column would corrupt every downstream cumulative series.

use std::path::Path;

use covid_tracker_snapshot_models::NormalizedRow;

use crate::SnapshotError;
use crate::discover::SnapshotFile;
use crate::parsing::{clean_text, parse_count};
use crate::registry::detect;
use crate::schema_def::{ColumnIndices, SchemaVariant};

/// Reads a snapshot file and normalizes every row.
///
/// Rows with a blank country/region are skipped with a warning, since they
/// cannot be assigned to any location.
///
/// # Errors
///
/// Returns [`SnapshotError::UnrecognizedSchema`] if no variant matches the
/// headers, [`SnapshotError::MissingColumn`] if the matched variant's
/// columns are incomplete, [`SnapshotError::InvalidCount`] for a malformed
/// count cell, or a CSV/I/O error if the file cannot be read.
pub fn read_snapshot(
    snapshot: &SnapshotFile,
    schemas: &[SchemaVariant],
) -> Result<Vec<NormalizedRow>, SnapshotError> {
    let path = snapshot.path.as_path();
    let csv_err = |source| SnapshotError::Csv {
        file: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let schema = detect(schemas, &headers).ok_or_else(|| SnapshotError::UnrecognizedSchema {
        file: path.to_path_buf(),
        date: snapshot.date,
        headers: headers.clone(),
    })?;
    let columns = schema
        .column_indices(&headers)
        .map_err(|unmapped| SnapshotError::MissingColumn {
            file: path.to_path_buf(),
            date: snapshot.date,
            schema: schema.id().to_string(),
            field: unmapped.field,
            column: unmapped.column,
        })?;

    log::debug!(
        "{}: schema {} ({})",
        path.display(),
        schema.id(),
        schema.name()
    );

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        if let Some(row) = normalize_record(&record, &columns, &headers, path)? {
            rows.push(row);
        }
    }

    Ok(rows)
}

/// Maps one raw row onto the canonical fields.
///
/// Returns `Ok(None)` for rows without a country/region.
///
/// # Errors
///
/// Returns [`SnapshotError::InvalidCount`] if a count cell is not empty and
/// not a non-negative whole number.
pub fn normalize_record(
    record: &csv::StringRecord,
    columns: &ColumnIndices,
    headers: &[String],
    file: &Path,
) -> Result<Option<NormalizedRow>, SnapshotError> {
    let line = record.position().map_or(0, csv::Position::line);

    let country_region = clean_text(record.get(columns.country_region));
    if country_region.is_empty() {
        log::warn!(
            "{} line {line}: row has no country/region, skipping",
            file.display()
        );
        return Ok(None);
    }

    let count = |index: usize| {
        let raw = record.get(index).unwrap_or_default();
        parse_count(raw).ok_or_else(|| SnapshotError::InvalidCount {
            file: file.to_path_buf(),
            line,
            column: headers.get(index).cloned().unwrap_or_default(),
            value: raw.to_string(),
        })
    };

    let sub_location = columns
        .sub_location
        .map(|index| clean_text(record.get(index)))
        .filter(|s| !s.is_empty())
        .map(String::from);

    Ok(Some(NormalizedRow {
        country_region: country_region.to_string(),
        province_state: clean_text(record.get(columns.province_state)).to_string(),
        sub_location,
        total_confirmed: count(columns.confirmed)?,
        total_deaths: count(columns.deaths)?,
        total_recovered: count(columns.recovered)?,
    }))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::NaiveDate;

    use super::*;
    use crate::registry::all_schemas;

    fn write_snapshot(name: &str, date: (i32, u32, u32), contents: &str) -> SnapshotFile {
        let dir = std::env::temp_dir().join(format!("covid_tracker_normalize_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("snapshot.csv");
        std::fs::write(&path, contents).unwrap();
        SnapshotFile {
            path,
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        }
    }

    fn cleanup(snapshot: &SnapshotFile) {
        let _ = std::fs::remove_dir_all(snapshot.path.parent().unwrap());
    }

    #[test]
    fn normalizes_slash_layout() {
        let snapshot = write_snapshot(
            "slash",
            (2020, 2, 26),
            "Province/State,Country/Region,Last Update,Confirmed,Deaths,Recovered\n\
             Hubei,Mainland China,2020-02-26T14:13:10,65187,2615,20969\n\
             ,South Korea,2020-02-26T14:13:10,1261,12,\n",
        );

        let rows = read_snapshot(&snapshot, &all_schemas().unwrap()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].province_state, "Hubei");
        assert_eq!(rows[0].country_region, "Mainland China");
        assert_eq!(rows[0].total_confirmed, 65187);
        assert_eq!(rows[0].sub_location, None);
        assert_eq!(rows[1].province_state, "");
        assert_eq!(rows[1].total_recovered, 0);

        cleanup(&snapshot);
    }

    #[test]
    fn normalizes_underscore_layout_with_sub_location() {
        let snapshot = write_snapshot(
            "underscore",
            (2020, 3, 24),
            "FIPS,Admin2,Province_State,Country_Region,Last_Update,Lat,Long_,Confirmed,Deaths,Recovered,Active,Combined_Key\n\
             36061,New York City,New York,US,2020-03-24 23:37:31,40.76,-73.97,14904,131,0,0,\"New York City, New York, US\"\n\
             ,,, Italy ,2020-03-24 23:37:31,41.87,12.56,69176,6820,8326,54030,Italy\n",
        );

        let rows = read_snapshot(&snapshot, &all_schemas().unwrap()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sub_location.as_deref(), Some("New York City"));
        assert_eq!(rows[0].province_state, "New York");
        assert_eq!(rows[0].total_deaths, 131);
        assert_eq!(rows[1].country_region, "Italy");
        assert_eq!(rows[1].sub_location, None);

        cleanup(&snapshot);
    }

    #[test]
    fn both_layouts_map_to_same_canonical_row() {
        let early = write_snapshot(
            "same_early",
            (2020, 3, 1),
            "Province/State,Country/Region,Confirmed,Deaths,Recovered\n\
             Ontario,Canada,5,1,2\n",
        );
        let late = write_snapshot(
            "same_late",
            (2020, 3, 30),
            "Province_State,Country_Region,Confirmed,Deaths,Recovered\n\
             Ontario,Canada,5,1,2\n",
        );

        let schemas = all_schemas().unwrap();
        assert_eq!(
            read_snapshot(&early, &schemas).unwrap(),
            read_snapshot(&late, &schemas).unwrap()
        );

        cleanup(&early);
        cleanup(&late);
    }

    #[test]
    fn unrecognized_layout_is_fatal_and_names_the_date() {
        let snapshot = write_snapshot(
            "unrecognized",
            (2020, 5, 1),
            "Region,Cases\nUS,10\n",
        );

        let err = read_snapshot(&snapshot, &all_schemas().unwrap()).unwrap_err();
        match err {
            SnapshotError::UnrecognizedSchema { date, headers, .. } => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2020, 5, 1).unwrap());
                assert_eq!(headers, ["Region", "Cases"]);
            }
            other => panic!("unexpected error: {other}"),
        }

        cleanup(&snapshot);
    }

    #[test]
    fn missing_mapped_column_is_fatal() {
        let snapshot = write_snapshot(
            "missing_column",
            (2020, 3, 10),
            "Province/State,Country/Region,Confirmed,Deaths\n\
             ,Italy,10,1\n",
        );

        let err = read_snapshot(&snapshot, &all_schemas().unwrap()).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::MissingColumn {
                field: "total_recovered",
                ..
            }
        ));

        cleanup(&snapshot);
    }

    #[test]
    fn invalid_count_reports_line_and_column() {
        let snapshot = write_snapshot(
            "invalid_count",
            (2020, 3, 10),
            "Province/State,Country/Region,Confirmed,Deaths,Recovered\n\
             ,Italy,10,1,0\n\
             ,Spain,lots,1,0\n",
        );

        let err = read_snapshot(&snapshot, &all_schemas().unwrap()).unwrap_err();
        match err {
            SnapshotError::InvalidCount {
                line,
                column,
                value,
                ..
            } => {
                assert_eq!(line, 3);
                assert_eq!(column, "Confirmed");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }

        cleanup(&snapshot);
    }

    #[test]
    fn rows_without_country_are_skipped() {
        let snapshot = write_snapshot(
            "no_country",
            (2020, 3, 10),
            "Province/State,Country/Region,Confirmed,Deaths,Recovered\n\
             Somewhere, ,10,1,0\n\
             ,Italy,3,0,0\n",
        );

        let rows = read_snapshot(&snapshot, &all_schemas().unwrap()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].country_region, "Italy");

        cleanup(&snapshot);
    }

    #[test]
    fn short_rows_zero_fill_trailing_counts() {
        let snapshot = write_snapshot(
            "short_row",
            (2020, 3, 10),
            "Province/State,Country/Region,Confirmed,Deaths,Recovered\n\
             ,Italy,3\n",
        );

        let rows = read_snapshot(&snapshot, &all_schemas().unwrap()).unwrap();
        assert_eq!(rows[0].total_confirmed, 3);
        assert_eq!(rows[0].total_deaths, 0);
        assert_eq!(rows[0].total_recovered, 0);

        cleanup(&snapshot);
    }

    #[test]
    fn record_without_position_still_normalizes() {
        let record = csv::StringRecord::from(vec!["Hubei", "China", "1", "2", "3"]);
        let columns = ColumnIndices {
            country_region: 1,
            province_state: 0,
            confirmed: 2,
            deaths: 3,
            recovered: 4,
            sub_location: None,
        };
        let headers: Vec<String> = ["p", "c", "x", "y", "z"].iter().map(ToString::to_string).collect();

        let row = normalize_record(&record, &columns, &headers, &PathBuf::from("mem.csv"))
            .unwrap()
            .unwrap();
        assert_eq!(row.total_recovered, 3);
    }
}
