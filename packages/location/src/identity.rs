//! Location identity resolution.
//!
//! Maps a `(country_region, province_state)` pair of free-text region names
//! to one [`LocationId`]. The mapping is a pure function of the trimmed
//! pair: case, incidental whitespace and diacritics never produce distinct
//! identities, and an empty province is the same as an absent one.

use covid_tracker_location_models::LocationId;

/// Resolves the identity of a location from its region names.
///
/// Both inputs are trimmed. A blank `province_state` yields the slug of
/// `country_region` alone; otherwise the slug of
/// `"{country_region}-{province_state}"`.
#[must_use]
pub fn resolve(country_region: &str, province_state: &str) -> LocationId {
    let country_region = country_region.trim();
    let province_state = province_state.trim();

    let slug = if province_state.is_empty() {
        slug::slugify(country_region)
    } else {
        slug::slugify(format!("{country_region}-{province_state}"))
    };

    LocationId::from_slug(slug)
}

/// Resolves an identity where the province may be missing entirely.
#[must_use]
pub fn resolve_opt(country_region: &str, province_state: Option<&str>) -> LocationId {
    resolve(country_region, province_state.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_province_matches_missing_province() {
        assert_eq!(resolve("Georgia", " "), resolve(" georgia", ""));
        assert_eq!(resolve("Georgia", ""), resolve_opt("Georgia", None));
        assert_eq!(resolve("Georgia", "").as_str(), "georgia");
    }

    #[test]
    fn joins_country_and_province() {
        assert_eq!(resolve("US", "New York").as_str(), "us-new-york");
        assert_eq!(
            resolve("  Mainland China ", " Hubei").as_str(),
            "mainland-china-hubei"
        );
    }

    #[test]
    fn case_and_whitespace_insensitive() {
        assert_eq!(resolve("US", "new york"), resolve("us ", "  New York"));
        assert_eq!(resolve("US", "New   York"), resolve("US", "New York"));
    }

    #[test]
    fn collapses_punctuation_runs() {
        assert_eq!(resolve("Korea, South", "").as_str(), "korea-south");
        assert_eq!(
            resolve("Bonaire, Sint Eustatius and Saba", "").as_str(),
            "bonaire-sint-eustatius-and-saba"
        );
        assert_eq!(resolve("--Taiwan*--", "").as_str(), "taiwan");
    }

    #[test]
    fn separator_inside_names_normalizes_once() {
        assert_eq!(
            resolve("Guinea-Bissau", "").as_str(),
            resolve("guinea bissau", "").as_str()
        );
    }

    #[test]
    fn folds_diacritics() {
        assert_eq!(resolve("Côte d'Ivoire", "").as_str(), "cote-d-ivoire");
        assert_eq!(resolve("Curaçao", ""), resolve("curacao", ""));
        assert_eq!(
            resolve("France", "Réunion").as_str(),
            "france-reunion"
        );
    }

    #[test]
    fn repeated_resolution_is_stable() {
        let first = resolve("Canada", "British Columbia");
        let second = resolve("Canada", "British Columbia");
        assert_eq!(first, second);
        assert_eq!(resolve(first.as_str(), "").as_str(), first.as_str());
    }
}
