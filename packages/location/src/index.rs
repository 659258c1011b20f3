//! Master location index.
//!
//! The index lists every reference location together with the public URL
//! its per-location artifact is published under. The URL is a pure
//! function of the configured base location and the identity, so it can
//! be embedded here without consulting the sink.

use covid_tracker_location_models::{Location, LocationId, LocationIndexEntry};

/// Returns the default public base URL for an S3 bucket.
#[must_use]
pub fn default_base_url(bucket: &str) -> String {
    format!("https://{bucket}.s3.amazonaws.com")
}

/// Returns the object name a location's artifact is published under.
#[must_use]
pub fn artifact_name(location_id: &LocationId) -> String {
    format!("{location_id}.json")
}

/// Builds the public URL of a location's artifact.
///
/// A trailing `/` on `base_url` is ignored.
#[must_use]
pub fn cloud_resource_url(base_url: &str, location_id: &LocationId) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        artifact_name(location_id)
    )
}

/// Builds the location index from the reference location table.
///
/// Entries keep the order of `locations` (the loader returns them sorted by
/// identity).
#[must_use]
pub fn build_index(locations: &[Location], base_url: &str) -> Vec<LocationIndexEntry> {
    locations
        .iter()
        .map(|location| LocationIndexEntry {
            country_region: location.country_region.clone(),
            province_state: location.province_state.clone(),
            lat: location.lat,
            long: location.long,
            location_id: location.location_id.clone(),
            cloud_resource: cloud_resource_url(base_url, &location.location_id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::resolve;

    #[test]
    fn url_is_derived_from_base_and_identity() {
        let id = resolve("US", "Washington");
        assert_eq!(
            cloud_resource_url("https://example-bucket.s3.amazonaws.com", &id),
            "https://example-bucket.s3.amazonaws.com/us-washington.json"
        );
        assert_eq!(
            cloud_resource_url("https://cdn.example.com/covid/", &id),
            "https://cdn.example.com/covid/us-washington.json"
        );
    }

    #[test]
    fn default_base_url_uses_virtual_hosted_bucket() {
        assert_eq!(
            default_base_url("thecodinginterface-covid"),
            "https://thecodinginterface-covid.s3.amazonaws.com"
        );
    }

    #[test]
    fn index_carries_coordinates_and_url() {
        let locations = vec![Location {
            location_id: resolve("Italy", ""),
            country_region: "Italy".to_string(),
            province_state: String::new(),
            lat: Some(43.0),
            long: Some(12.0),
        }];

        let index = build_index(&locations, "https://b.example.com");
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].location_id.as_str(), "italy");
        assert_eq!(index[0].cloud_resource, "https://b.example.com/italy.json");
        assert_eq!(index[0].lat, Some(43.0));
    }
}
