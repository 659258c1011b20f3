#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Location identity and location index types.
//!
//! A location is a `(country_region, province_state)` pair. Every location
//! is keyed by a [`LocationId`], a URL- and filename-safe slug that names
//! its per-location artifact and appears in the published location index.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical slug uniquely naming a `(country_region, province_state)` pair.
///
/// Constructed by the identity resolver; the inner string is always
/// lower-case ASCII alphanumerics separated by single `-` characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(String);

impl LocationId {
    /// Wraps an already-slugged identity string.
    ///
    /// Callers outside the resolver should prefer resolving from the raw
    /// region names so the slugging rules are applied.
    #[must_use]
    pub const fn from_slug(slug: String) -> Self {
        Self(slug)
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LocationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A location as read from the reference file.
///
/// Immutable once loaded; daily records reference it by [`LocationId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Stable identity derived from the trimmed region names.
    pub location_id: LocationId,
    /// Country or region name, trimmed.
    pub country_region: String,
    /// Province or state name, trimmed. Empty when the location is a whole
    /// country/region.
    pub province_state: String,
    /// Latitude (WGS84), absent when the reference file has no value.
    pub lat: Option<f64>,
    /// Longitude (WGS84), absent when the reference file has no value.
    pub long: Option<f64>,
}

/// One row of the published master location index.
///
/// Field order is the serialized field order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationIndexEntry {
    /// Country or region name.
    pub country_region: String,
    /// Province or state name (empty for whole-country locations).
    pub province_state: String,
    /// Latitude, `null` when unknown.
    pub lat: Option<f64>,
    /// Longitude, `null` when unknown.
    pub long: Option<f64>,
    /// Identity key, also the per-location artifact's base name.
    pub location_id: LocationId,
    /// Public URL of the per-location artifact.
    pub cloud_resource: String,
}
