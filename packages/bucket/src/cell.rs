//! Geohash cells used as bucket keys.

use photo_regions_photo_models::BucketKey;
use photo_regions_region_models::Coordinate;
use serde::{Deserialize, Serialize};

use crate::BucketError;

/// Geohash length used for bucketing.
///
/// Higher precision means smaller cells, more buckets and more
/// nearest-region queries. Measured on a 46,000 photo library:
///
/// | precision | cell size | relative run time |
/// |-----------|-----------|-------------------|
/// | 4         | ~40 km    | 1x                |
/// | 5         | ~5 km     | ~2x               |
/// | 6         | ~1 km     | ~4x               |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Precision(u8);

impl Precision {
    /// Shortest supported geohash.
    pub const MIN: u8 = 1;
    /// Longest supported geohash.
    pub const MAX: u8 = 12;
    /// Default precision (~5 km cells).
    pub const DEFAULT: Self = Self(5);

    /// Creates a precision in `MIN..=MAX`.
    ///
    /// # Errors
    ///
    /// Returns [`BucketError::InvalidPrecision`] if out of range.
    pub const fn new(chars: u8) -> Result<Self, BucketError> {
        if chars < Self::MIN || chars > Self::MAX {
            return Err(BucketError::InvalidPrecision(chars));
        }
        Ok(Self(chars))
    }

    /// Number of geohash characters.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for Precision {
    type Error = BucketError;

    fn try_from(chars: u8) -> Result<Self, Self::Error> {
        Self::new(chars)
    }
}

impl From<Precision> for u8 {
    fn from(precision: Precision) -> Self {
        precision.0
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Precision {
    type Err = BucketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: u8 = s
            .trim()
            .parse()
            .map_err(|_| BucketError::UnparseablePrecision(s.to_string()))?;
        Self::new(chars)
    }
}

/// Largest latitude the encoder maps into the northernmost row of cells.
const TOP_LATITUDE: f64 = f64::from_bits(90f64.to_bits() - 1);

/// Largest longitude the encoder maps into the easternmost column of cells.
const TOP_LONGITUDE: f64 = f64::from_bits(180f64.to_bits() - 1);

/// Encodes a coordinate into the key of the cell that contains it.
///
/// Cells are half-open, so the north pole and the antimeridian are folded
/// onto the last representable value below them and land in the top row or
/// last column instead of wrapping around.
///
/// # Errors
///
/// Returns [`BucketError::Encode`] if the geohash encoder rejects the input.
pub fn encode(coord: &Coordinate, precision: Precision) -> Result<BucketKey, BucketError> {
    let point = geohash::Coord {
        x: coord.longitude().min(TOP_LONGITUDE),
        y: coord.latitude().min(TOP_LATITUDE),
    };

    geohash::encode(point, usize::from(precision.get()))
        .map(BucketKey::new)
        .map_err(|e| BucketError::Encode {
            coordinate: *coord,
            reason: e.to_string(),
        })
}

/// Geometric center of a cell, derived from the key alone.
///
/// # Errors
///
/// Returns [`BucketError::InvalidKey`] if `key` is not a valid geohash.
pub fn center(key: &BucketKey) -> Result<Coordinate, BucketError> {
    let invalid = |reason: String| BucketError::InvalidKey {
        key: key.clone(),
        reason,
    };

    let (point, _lng_err, _lat_err) =
        geohash::decode(key.as_str()).map_err(|e| invalid(e.to_string()))?;

    Coordinate::new(point.y, point.x).map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(latitude: f64, longitude: f64) -> Coordinate {
        Coordinate::new(latitude, longitude).unwrap()
    }

    #[test]
    fn precision_bounds() {
        assert!(Precision::new(0).is_err());
        assert!(Precision::new(13).is_err());
        assert_eq!(Precision::new(1).unwrap().get(), 1);
        assert_eq!(Precision::new(12).unwrap().get(), 12);
        assert_eq!(Precision::default().get(), 5);
    }

    #[test]
    fn precision_parses() {
        assert_eq!("6".parse::<Precision>().unwrap().get(), 6);
        assert!(matches!(
            "six".parse::<Precision>(),
            Err(BucketError::UnparseablePrecision(_))
        ));
        assert!(matches!(
            "20".parse::<Precision>(),
            Err(BucketError::InvalidPrecision(20))
        ));
    }

    #[test]
    fn precision_deserializes_with_validation() {
        let p: Precision = serde_json::from_str("4").unwrap();
        assert_eq!(p.get(), 4);
        assert!(serde_json::from_str::<Precision>("0").is_err());
    }

    #[test]
    fn encodes_known_cells() {
        let p3 = Precision::new(3).unwrap();
        let p5 = Precision::new(5).unwrap();

        assert_eq!(encode(&coord(30.30, -97.70), p3).unwrap().as_str(), "9v6");
        assert_eq!(encode(&coord(30.30, -97.70), p5).unwrap().as_str(), "9v6s2");
        assert_eq!(encode(&coord(30.25, -97.80), p5).unwrap().as_str(), "9v6kn");
        assert_eq!(encode(&coord(39.74, -104.99), p3).unwrap().as_str(), "9xj");
    }

    #[test]
    fn key_length_matches_precision() {
        for chars in Precision::MIN..=Precision::MAX {
            let key = encode(&coord(-33.86, 151.21), Precision::new(chars).unwrap()).unwrap();
            assert_eq!(key.precision(), usize::from(chars));
        }
    }

    #[test]
    fn same_cell_same_key() {
        let p3 = Precision::new(3).unwrap();
        assert_eq!(
            encode(&coord(30.30, -97.70), p3).unwrap(),
            encode(&coord(30.25, -97.80), p3).unwrap()
        );

        let p4 = Precision::new(4).unwrap();
        assert_ne!(
            encode(&coord(30.30, -97.70), p4).unwrap(),
            encode(&coord(30.25, -97.80), p4).unwrap()
        );
    }

    #[test]
    fn north_pole_stays_in_top_row() {
        let p5 = Precision::new(5).unwrap();
        let pole = encode(&coord(90.0, 0.0), p5).unwrap();

        assert_eq!(pole.as_str(), "upbpb");
        assert_eq!(pole, encode(&coord(89.99, 0.0), p5).unwrap());
        assert_ne!(pole, encode(&coord(-90.0, 0.0), p5).unwrap());
    }

    #[test]
    fn antimeridian_stays_in_last_column() {
        let p5 = Precision::new(5).unwrap();
        let east = encode(&coord(0.0, 180.0), p5).unwrap();

        assert_eq!(east.as_str(), "xbpbp");
        assert_eq!(east, encode(&coord(0.0, 179.99), p5).unwrap());
        assert_ne!(east, encode(&coord(0.0, -180.0), p5).unwrap());
    }

    #[test]
    fn center_is_cell_midpoint() {
        let c = center(&BucketKey::new("9v6")).unwrap();
        assert!((c.latitude() - 30.234_375).abs() < 1e-9);
        assert!((c.longitude() - -97.734_375).abs() < 1e-9);

        let c = center(&BucketKey::new("s0000")).unwrap();
        assert!((c.latitude() - 0.021_972_656_25).abs() < 1e-9);
        assert!((c.longitude() - 0.021_972_656_25).abs() < 1e-9);
    }

    #[test]
    fn center_encodes_back_to_its_key() {
        let p = Precision::new(6).unwrap();
        let key = encode(&coord(51.5074, -0.1278), p).unwrap();
        assert_eq!(encode(&center(&key).unwrap(), p).unwrap(), key);
    }

    #[test]
    fn invalid_key_is_rejected() {
        assert!(matches!(
            center(&BucketKey::new("abc!")),
            Err(BucketError::InvalidKey { .. })
        ));
    }
}
