//! Schema variant registry. Loads every known snapshot layout from
//! embedded TOML configs.
//!
//! Each `.toml` file in `packages/snapshot/schemas/` is baked into the
//! binary at compile time via [`include_str!`]. Variants are tried in the
//! order listed here.

use crate::SnapshotError;
use crate::schema_def::{SchemaVariant, parse_schema_toml};

/// TOML configs embedded at compile time.
const SCHEMA_TOMLS: &[(&str, &str)] = &[
    ("slash_v1", include_str!("../schemas/slash_v1.toml")),
    ("underscore_v2", include_str!("../schemas/underscore_v2.toml")),
];

/// Total number of configured variants (used in tests).
#[cfg(test)]
const EXPECTED_SCHEMA_COUNT: usize = 2;

/// Returns all configured schema variants, parsed from embedded TOML.
///
/// # Errors
///
/// Returns [`SnapshotError::Registry`] if an embedded config is malformed.
pub fn all_schemas() -> Result<Vec<SchemaVariant>, SnapshotError> {
    SCHEMA_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_schema_toml(toml).map_err(|message| SnapshotError::Registry {
                name: (*name).to_string(),
                message,
            })
        })
        .collect()
}

/// Returns the first variant whose detection headers are all present.
#[must_use]
pub fn detect<'a>(schemas: &'a [SchemaVariant], headers: &[String]) -> Option<&'a SchemaVariant> {
    schemas.iter().find(|s| s.matches(headers))
}
