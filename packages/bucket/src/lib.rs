#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geohash bucketing of photos and per-bucket region resolution.
//!
//! Photos are grouped by the geohash cell their coordinate falls in
//! ([`bucketer::bucket`]). Each cell is then resolved once: the cell center
//! is looked up in the [`RegionIndex`] and the resulting region is stamped
//! onto every photo in the cell ([`resolver::resolve`]). Nearest-region
//! lookups therefore scale with the number of occupied cells rather than
//! the number of photos.
//!
//! [`RegionIndex`]: photo_regions_region::RegionIndex

pub mod bucketer;
pub mod cell;
pub mod resolver;

use photo_regions_photo_models::{BucketKey, StatusTransitionError};
use photo_regions_region_models::Coordinate;

pub use bucketer::{PhotoPartition, bucket};
pub use cell::{Precision, center, encode};
pub use resolver::{ResolvedBucket, resolve};

/// Errors from bucketing photos or decoding bucket keys.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BucketError {
    /// Precision outside the supported geohash lengths.
    #[error("Invalid precision {0}: must be between {min} and {max}", min = Precision::MIN, max = Precision::MAX)]
    InvalidPrecision(u8),

    /// Precision given as text that is not a number.
    #[error("Invalid precision '{0}': not a number")]
    UnparseablePrecision(String),

    /// The geohash encoder rejected a coordinate.
    #[error("Failed to encode {coordinate}: {reason}")]
    Encode {
        /// Coordinate being encoded.
        coordinate: Coordinate,
        /// Encoder error message.
        reason: String,
    },

    /// A key is not a valid geohash.
    #[error("Invalid bucket key '{key}': {reason}")]
    InvalidKey {
        /// The offending key.
        key: BucketKey,
        /// Decoder error message.
        reason: String,
    },

    /// A photo was not in a state that allows bucketing.
    #[error(transparent)]
    Transition(#[from] StatusTransitionError),
}

/// Errors from resolving a single bucket.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    /// The bucket key could not be decoded to a representative coordinate.
    #[error(transparent)]
    Bucket(#[from] BucketError),

    /// A photo in the bucket was not in the `bucketed` state.
    #[error(transparent)]
    Transition(#[from] StatusTransitionError),
}
