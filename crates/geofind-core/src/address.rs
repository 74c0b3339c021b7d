//! Address normalization and coordinate text helpers.
//!
//! The resolver and the favorite recorder both match stored locations on a
//! canonical address key, so "  Paris " and "paris" land on the same row.

use crate::defaults::COORDINATE_DISPLAY_PRECISION;
use crate::error::{Error, Result};

/// Valid latitude range in degrees.
pub const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;

/// Valid longitude range in degrees.
pub const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

/// Canonical matching key for an address: trimmed, lowercased, with runs of
/// whitespace collapsed to a single space.
///
/// ```
/// use geofind_core::address::address_key;
///
/// assert_eq!(address_key("  Rue de  Rivoli\tParis "), "rue de rivoli paris");
/// ```
pub fn address_key(address: &str) -> String {
    address
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reject latitude/longitude values outside the WGS84 ranges (or NaN).
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    if !LATITUDE_RANGE.contains(&latitude) {
        return Err(Error::Validation(format!(
            "latitude {} outside -90..90",
            latitude
        )));
    }
    if !LONGITUDE_RANGE.contains(&longitude) {
        return Err(Error::Validation(format!(
            "longitude {} outside -180..180",
            longitude
        )));
    }
    Ok(())
}

/// Render a coordinate pair as `"lat, lon"` with fixed precision.
pub fn format_coordinate_pair(latitude: f64, longitude: f64) -> String {
    format!(
        "{:.prec$}, {:.prec$}",
        latitude,
        longitude,
        prec = COORDINATE_DISPLAY_PRECISION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_key_trims_and_lowercases() {
        assert_eq!(address_key("  PARIS  "), "paris");
    }

    #[test]
    fn test_address_key_collapses_inner_whitespace() {
        assert_eq!(address_key("10  Downing\n Street"), "10 downing street");
    }

    #[test]
    fn test_address_key_of_blank_is_empty() {
        assert_eq!(address_key(" \t\n"), "");
    }

    #[test]
    fn test_address_key_keeps_punctuation() {
        assert_eq!(address_key("Paris, France"), "paris, france");
    }

    #[test]
    fn test_validate_coordinates_accepts_bounds() {
        assert!(validate_coordinates(90.0, 180.0).is_ok());
        assert!(validate_coordinates(-90.0, -180.0).is_ok());
        assert!(validate_coordinates(0.0, 0.0).is_ok());
    }

    #[test]
    fn test_validate_coordinates_rejects_out_of_range() {
        assert!(matches!(
            validate_coordinates(90.5, 0.0),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            validate_coordinates(0.0, -180.01),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_validate_coordinates_rejects_nan() {
        assert!(validate_coordinates(f64::NAN, 0.0).is_err());
        assert!(validate_coordinates(0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_format_coordinate_pair() {
        assert_eq!(
            format_coordinate_pair(48.8566, 2.3522),
            "48.856600, 2.352200"
        );
        assert_eq!(
            format_coordinate_pair(-33.8688197, 151.2093),
            "-33.868820, 151.209300"
        );
    }
}
