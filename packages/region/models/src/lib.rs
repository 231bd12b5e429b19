#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Reference region and coordinate types.
//!
//! A [`Region`] is one row of the reference table (a city or town with its
//! province and country). A [`Coordinate`] is a validated latitude/longitude
//! pair in degrees. Neither type performs I/O.

use serde::{Deserialize, Serialize};

/// Errors produced when constructing a [`Coordinate`].
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    /// Latitude or longitude is NaN or infinite.
    #[error("Coordinate is not finite: ({latitude}, {longitude})")]
    NotFinite {
        /// Supplied latitude.
        latitude: f64,
        /// Supplied longitude.
        longitude: f64,
    },

    /// Latitude outside ±90 or longitude outside ±180.
    #[error("Coordinate out of range: ({latitude}, {longitude})")]
    OutOfRange {
        /// Supplied latitude.
        latitude: f64,
        /// Supplied longitude.
        longitude: f64,
    },
}

/// A latitude/longitude pair in decimal degrees (WGS84).
///
/// Always finite and within ±90 latitude / ±180 longitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate", into = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Creates a validated coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError`] if either value is non-finite or out of
    /// range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(CoordinateError::NotFinite {
                latitude,
                longitude,
            });
        }

        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::OutOfRange {
                latitude,
                longitude,
            });
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Squared planar distance in degree-space.
    ///
    /// This is not a great-circle distance. It only orders candidates the
    /// same way the Euclidean degree distance does.
    #[must_use]
    #[allow(clippy::suboptimal_flops)]
    pub fn distance_2(&self, latitude: f64, longitude: f64) -> f64 {
        let dlat = self.latitude - latitude;
        let dlng = self.longitude - longitude;
        dlat * dlat + dlng * dlng
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CoordinateError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl From<Coordinate> for RawCoordinate {
    fn from(coord: Coordinate) -> Self {
        Self {
            latitude: coord.latitude,
            longitude: coord.longitude,
        }
    }
}

/// A named reference region, one row of the reference table.
///
/// Immutable after load; two regions are equal when every field is equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    /// Region (city/town) name.
    pub name: String,
    /// Centroid latitude.
    pub latitude: f64,
    /// Centroid longitude.
    pub longitude: f64,
    /// Country code (e.g. "US").
    pub country_code: String,
    /// Province/state code (e.g. "TX").
    pub province_code: String,
    /// Country name. Empty when the table row omits it.
    pub country_name: String,
    /// Province/state name, if the table row carries one.
    pub province_name: Option<String>,
}

impl Region {
    /// Human-readable label, e.g. "Austin, Texas, United States".
    #[must_use]
    pub fn label(&self) -> String {
        let mut parts = vec![self.name.as_str()];
        if let Some(province) = self.province_name.as_deref().filter(|p| !p.is_empty()) {
            parts.push(province);
        }
        if !self.country_name.is_empty() {
            parts.push(&self.country_name);
        }
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn austin() -> Region {
        Region {
            name: "Austin".to_string(),
            latitude: 30.27,
            longitude: -97.74,
            country_code: "US".to_string(),
            province_code: "TX".to_string(),
            country_name: "United States".to_string(),
            province_name: Some("Texas".to_string()),
        }
    }

    #[test]
    fn coordinate_accepts_bounds() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
        assert!(Coordinate::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn coordinate_rejects_out_of_range() {
        assert!(matches!(
            Coordinate::new(90.5, 0.0),
            Err(CoordinateError::OutOfRange { .. })
        ));
        assert!(matches!(
            Coordinate::new(0.0, -180.1),
            Err(CoordinateError::OutOfRange { .. })
        ));
    }

    #[test]
    fn coordinate_rejects_non_finite() {
        assert!(matches!(
            Coordinate::new(f64::NAN, 0.0),
            Err(CoordinateError::NotFinite { .. })
        ));
        assert!(matches!(
            Coordinate::new(0.0, f64::INFINITY),
            Err(CoordinateError::NotFinite { .. })
        ));
    }

    #[test]
    fn distance_orders_like_euclidean() {
        let coord = Coordinate::new(30.30, -97.70).unwrap();
        let near = coord.distance_2(30.27, -97.74);
        let far = coord.distance_2(39.74, -104.99);
        assert!(near < far);
        assert!((coord.distance_2(30.30, -97.70)).abs() < f64::EPSILON);
    }

    #[test]
    fn coordinate_deserialize_validates() {
        let ok: Coordinate =
            serde_json::from_str(r#"{"latitude":30.3,"longitude":-97.7}"#).unwrap();
        assert!((ok.latitude() - 30.3).abs() < f64::EPSILON);

        let bad = serde_json::from_str::<Coordinate>(r#"{"latitude":120.0,"longitude":0.0}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn label_skips_missing_parts() {
        let mut region = austin();
        assert_eq!(region.label(), "Austin, Texas, United States");

        region.province_name = None;
        assert_eq!(region.label(), "Austin, United States");

        region.country_name = String::new();
        assert_eq!(region.label(), "Austin");
    }
}
