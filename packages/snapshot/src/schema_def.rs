//! Config-driven snapshot schema variants.
//!
//! A [`SchemaVariant`] captures one historical column layout of the daily
//! snapshots: which headers identify it and which source column each
//! canonical field is read from. Adding a new historical layout is a new
//! TOML file in `packages/snapshot/schemas/`, not new code.

use serde::Deserialize;

/// One historical snapshot column layout.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaVariant {
    /// Unique identifier (e.g., `"slash_v1"`).
    pub id: String,
    /// Human-readable description.
    pub name: String,
    /// Headers that must all be present for a snapshot to match this
    /// variant.
    pub detect: Vec<String>,
    /// Source column for each canonical field.
    pub columns: ColumnMapping,
    /// Optional finer-than-province column. Rows are still keyed by
    /// province; this is kept only for diagnostics.
    #[serde(default)]
    pub sub_location: Option<String>,
}

/// Maps canonical snapshot fields to source column headers.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnMapping {
    /// Header of the country/region column.
    pub country_region: String,
    /// Header of the province/state column.
    pub province_state: String,
    /// Header of the cumulative confirmed column.
    pub confirmed: String,
    /// Header of the cumulative deaths column.
    pub deaths: String,
    /// Header of the cumulative recovered column.
    pub recovered: String,
}

/// Resolved column positions of a matched variant within one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndices {
    /// Position of the country/region column.
    pub country_region: usize,
    /// Position of the province/state column.
    pub province_state: usize,
    /// Position of the confirmed column.
    pub confirmed: usize,
    /// Position of the deaths column.
    pub deaths: usize,
    /// Position of the recovered column.
    pub recovered: usize,
    /// Position of the sub-location column, if the variant has one and the
    /// snapshot carries it.
    pub sub_location: Option<usize>,
}

/// A canonical field whose mapped column is absent from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmappedField {
    /// Canonical field name.
    pub field: &'static str,
    /// Source column the variant expected.
    pub column: String,
}

impl SchemaVariant {
    /// Returns the unique variant identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the human-readable variant name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if every detection header is present in `headers`.
    #[must_use]
    pub fn matches(&self, headers: &[String]) -> bool {
        !self.detect.is_empty()
            && self
                .detect
                .iter()
                .all(|d| headers.iter().any(|h| h == d))
    }

    /// Resolves every canonical field to a column position.
    ///
    /// # Errors
    ///
    /// Returns the first [`UnmappedField`] whose column is missing from
    /// `headers`.
    pub fn column_indices(&self, headers: &[String]) -> Result<ColumnIndices, UnmappedField> {
        let position = |field: &'static str, column: &str| {
            headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| UnmappedField {
                    field,
                    column: column.to_string(),
                })
        };

        let columns = &self.columns;
        Ok(ColumnIndices {
            country_region: position("country_region", &columns.country_region)?,
            province_state: position("province_state", &columns.province_state)?,
            confirmed: position("total_confirmed", &columns.confirmed)?,
            deaths: position("total_deaths", &columns.deaths)?,
            recovered: position("total_recovered", &columns.recovered)?,
            sub_location: self
                .sub_location
                .as_deref()
                .and_then(|column| headers.iter().position(|h| h == column)),
        })
    }
}

/// Parses a schema variant from a TOML string.
///
/// # Errors
///
/// Returns an error message if the TOML is malformed or missing fields.
pub fn parse_schema_toml(toml_str: &str) -> Result<SchemaVariant, String> {
    toml::de::from_str(toml_str).map_err(|e| e.to_string())
}
