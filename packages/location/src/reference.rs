//! Reference-file loader for the location table.
//!
//! The reference file is the wide confirmed-cases time series: one row per
//! location with `Province/State`, `Country/Region`, `Lat`, `Long` followed
//! by one column per date. Only the four location columns are read.

use std::collections::BTreeSet;
use std::path::Path;

use covid_tracker_location_models::Location;

use crate::LocationError;
use crate::identity::resolve;

/// Accepted header spellings for each location column, tried in order.
const PROVINCE_HEADERS: &[&str] = &["Province/State", "Province_State"];
const COUNTRY_HEADERS: &[&str] = &["Country/Region", "Country_Region"];
const LAT_HEADERS: &[&str] = &["Lat", "Latitude"];
const LONG_HEADERS: &[&str] = &["Long", "Long_", "Longitude"];

/// Loads the location table from the reference file at `path`.
///
/// Region names are trimmed and a missing province becomes the empty
/// string. Coordinates that are empty or unparseable are absent. Rows whose
/// identity was already seen are dropped with a warning, so every returned
/// location has a unique [`LocationId`].
///
/// The returned table is ordered by identity.
///
/// # Errors
///
/// Returns [`LocationError::MissingColumn`] if the country or province
/// column cannot be found, or a CSV/I/O error if the file cannot be read.
///
/// [`LocationId`]: covid_tracker_location_models::LocationId
pub fn load_locations(path: &Path) -> Result<Vec<Location>, LocationError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let require = |field: &'static str, candidates: &[&str]| {
        find_column(&headers, candidates).ok_or_else(|| LocationError::MissingColumn {
            file: path.to_path_buf(),
            field,
            headers: headers.clone(),
        })
    };
    let country_col = require("country_region", COUNTRY_HEADERS)?;
    let province_col = require("province_state", PROVINCE_HEADERS)?;
    let lat_col = find_column(&headers, LAT_HEADERS);
    let long_col = find_column(&headers, LONG_HEADERS);

    let mut seen = BTreeSet::new();
    let mut locations = Vec::new();

    for record in reader.records() {
        let record = record?;
        let country_region = record.get(country_col).unwrap_or_default().trim();
        if country_region.is_empty() {
            log::debug!(
                "{}: skipping row {} with no country/region",
                path.display(),
                record.position().map_or(0, csv::Position::line),
            );
            continue;
        }
        let province_state = record.get(province_col).unwrap_or_default().trim();

        let location_id = resolve(country_region, province_state);
        if !seen.insert(location_id.clone()) {
            log::warn!(
                "{}: duplicate location {location_id} ({country_region:?}, {province_state:?}), keeping first",
                path.display(),
            );
            continue;
        }

        locations.push(Location {
            location_id,
            country_region: country_region.to_string(),
            province_state: province_state.to_string(),
            lat: lat_col.and_then(|i| parse_coord(record.get(i))),
            long: long_col.and_then(|i| parse_coord(record.get(i))),
        });
    }

    locations.sort_by(|a, b| a.location_id.cmp(&b.location_id));
    log::info!(
        "Loaded {} locations from {}",
        locations.len(),
        path.display()
    );
    Ok(locations)
}

/// Returns the index of the first header matching any candidate.
fn find_column(headers: &[String], candidates: &[&str]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|c| headers.iter().position(|h| h == c))
}

/// Parses an optional coordinate cell. Empty, unparseable and non-finite
/// values are absent.
fn parse_coord(cell: Option<&str>) -> Option<f64> {
    let value = cell?.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_reference(name: &str, contents: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("covid_tracker_reference_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("reference.csv");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_trimmed_locations_sorted_by_identity() {
        let path = write_reference(
            "sorted",
            "Province/State,Country/Region,Lat,Long,1/22/20,1/23/20\n\
             Hubei ,Mainland China,30.9756,112.2707,444,444\n\
             ,Thailand,15.0,101.0,2,3\n\
             ,Afghanistan,33.0,65.0,0,0\n",
        );

        let locations = load_locations(&path).unwrap();
        let ids: Vec<&str> = locations.iter().map(|l| l.location_id.as_str()).collect();
        assert_eq!(ids, ["afghanistan", "mainland-china-hubei", "thailand"]);

        let hubei = &locations[1];
        assert_eq!(hubei.province_state, "Hubei");
        assert_eq!(hubei.country_region, "Mainland China");
        assert!((hubei.lat.unwrap() - 30.9756).abs() < f64::EPSILON);

        assert_eq!(locations[2].province_state, "");

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn missing_coordinates_are_absent() {
        let path = write_reference(
            "coords",
            "Province/State,Country/Region,Lat,Long\n\
             ,Cruise Ship,,\n\
             ,Nowhere,abc,12.5\n",
        );

        let locations = load_locations(&path).unwrap();
        assert_eq!(locations.len(), 2);
        assert!(locations[0].lat.is_none());
        assert!(locations[0].long.is_none());
        assert!(locations[1].lat.is_none());
        assert!((locations[1].long.unwrap() - 12.5).abs() < f64::EPSILON);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn duplicate_identities_keep_first_row() {
        let path = write_reference(
            "duplicates",
            "Province/State,Country/Region,Lat,Long\n\
             ,Georgia,42.3,43.3\n\
             , georgia ,0.0,0.0\n",
        );

        let locations = load_locations(&path).unwrap();
        assert_eq!(locations.len(), 1);
        assert!((locations[0].lat.unwrap() - 42.3).abs() < f64::EPSILON);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn accepts_underscore_headers() {
        let path = write_reference(
            "underscore",
            "Province_State,Country_Region,Lat,Long_\n\
             Ontario,Canada,51.25,-85.32\n",
        );

        let locations = load_locations(&path).unwrap();
        assert_eq!(locations[0].location_id.as_str(), "canada-ontario");
        assert!((locations[0].long.unwrap() - -85.32).abs() < f64::EPSILON);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn missing_country_column_is_an_error() {
        let path = write_reference("no_country", "Province/State,Lat,Long\nHubei,1,2\n");

        let err = load_locations(&path).unwrap_err();
        assert!(matches!(
            err,
            LocationError::MissingColumn {
                field: "country_region",
                ..
            }
        ));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
