//! Shared parsing utilities for snapshot cells.

/// Parses a cumulative count cell.
///
/// Empty cells are zero ("nothing reported"). Whole numbers are accepted
/// either as integers or as decimals with a zero fraction (`"5.0"`), which
/// some snapshots contain. Returns `None` for negative, fractional or
/// non-numeric text.
#[must_use]
pub fn parse_count(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0);
    }
    if let Ok(value) = trimmed.parse::<u64>() {
        return Some(value);
    }

    let value = trimmed.parse::<f64>().ok()?;
    #[allow(clippy::cast_precision_loss)]
    let in_range = value.is_finite() && value >= 0.0 && value < u64::MAX as f64;
    if !in_range || value.fract() > 0.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some(value as u64)
}

/// Trims a text cell; a missing cell is the empty string.
#[must_use]
pub fn clean_text(cell: Option<&str>) -> &str {
    cell.map_or("", str::trim)
}
