//! Country population reference table.
//!
//! A two-column CSV (`country_region,population`). The country column may
//! also be spelled `Country/Region` or `Country_Region`. Rows with an empty
//! population cell are skipped.

use std::collections::BTreeMap;
use std::path::Path;

use crate::SeriesError;

const COUNTRY_HEADERS: &[&str] = &["country_region", "Country/Region", "Country_Region"];
const POPULATION_HEADERS: &[&str] = &["population", "Population"];

/// Population keyed by trimmed country/region name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulationTable {
    by_country: BTreeMap<String, u64>,
}

impl PopulationTable {
    /// Population of `country_region`, if the table has it.
    #[must_use]
    pub fn get(&self, country_region: &str) -> Option<u64> {
        self.by_country.get(country_region.trim()).copied()
    }

    /// Number of countries in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_country.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_country.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for PopulationTable {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        Self {
            by_country: iter
                .into_iter()
                .map(|(country, population)| (country.into().trim().to_string(), population))
                .collect(),
        }
    }
}

/// Loads the population table from `path`.
///
/// A country listed twice keeps its last value.
///
/// # Errors
///
/// Returns [`SeriesError::MissingColumn`] when either column is absent,
/// [`SeriesError::InvalidPopulation`] for a non-integer population, or a
/// CSV error if the file cannot be read.
pub fn load_population(path: &Path) -> Result<PopulationTable, SeriesError> {
    let csv_err = |source| SeriesError::Csv {
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

    let require = |column: &'static str, candidates: &[&str]| {
        candidates
            .iter()
            .find_map(|c| headers.iter().position(|h| h == c))
            .ok_or_else(|| SeriesError::MissingColumn {
                file: path.to_path_buf(),
                column,
                headers: headers.clone(),
            })
    };
    let country_col = require("country_region", COUNTRY_HEADERS)?;
    let population_col = require("population", POPULATION_HEADERS)?;

    let mut by_country = BTreeMap::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let country = record.get(country_col).unwrap_or_default().trim();
        let value = record.get(population_col).unwrap_or_default().trim();
        if country.is_empty() || value.is_empty() {
            continue;
        }

        let population = value
            .parse::<u64>()
            .map_err(|_| SeriesError::InvalidPopulation {
                file: path.to_path_buf(),
                line: record.position().map_or(0, csv::Position::line),
                country: country.to_string(),
                value: value.to_string(),
            })?;
        by_country.insert(country.to_string(), population);
    }

    log::info!(
        "Loaded population for {} countries from {}",
        by_country.len(),
        path.display()
    );
    Ok(PopulationTable { by_country })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(name: &str, contents: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("world_population.csv");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_countries_and_skips_blank_cells() {
        let path = write(
            "covid_tracker_population_load",
            "country_region,population\nItaly,60461826\n Spain ,46754778\nNowhere,\n",
        );

        let table = load_population(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("Italy"), Some(60_461_826));
        assert_eq!(table.get("Spain"), Some(46_754_778));
        assert_eq!(table.get("Nowhere"), None);
        assert!(!table.is_empty());
        assert!(PopulationTable::default().is_empty());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn rejects_non_integer_population() {
        let path = write(
            "covid_tracker_population_invalid",
            "Country/Region,Population\nItaly,lots\n",
        );

        match load_population(&path).unwrap_err() {
            SeriesError::InvalidPopulation { line, value, .. } => {
                assert_eq!(line, 2);
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn missing_population_column_is_an_error() {
        let path = write("covid_tracker_population_missing", "country_region,pop\nItaly,1\n");
        assert!(matches!(
            load_population(&path),
            Err(SeriesError::MissingColumn { column: "population", .. })
        ));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
