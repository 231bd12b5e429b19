#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Photo record and region resolution status types.
//!
//! A [`PhotoRecord`] carries a single evolving [`RegionStatus`] tag that only
//! moves forward:
//!
//! ```text
//! unresolved -> no_coordinate
//! unresolved -> bucketed(key) -> resolved(region)
//! ```

use std::sync::Arc;

use photo_regions_region_models::{Coordinate, Region};
use serde::{Deserialize, Serialize};
use strum_macros::AsRefStr;

/// Opaque, unique photo identifier taken from the source asset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoId(String);

impl PhotoId {
    /// Wraps a source identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhotoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PhotoId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PhotoId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A spatial bucket key: a geohash string at a fixed precision.
///
/// Two coordinates share a key iff they fall in the same geohash cell.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketKey(String);

impl BucketKey {
    /// Wraps an encoded geohash.
    #[must_use]
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// The encoded geohash.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of geohash characters.
    #[must_use]
    pub fn precision(&self) -> usize {
        self.0.len()
    }
}

impl std::fmt::Display for BucketKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Region resolution status of a single photo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, AsRefStr)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RegionStatus {
    /// Freshly enumerated; not yet bucketed.
    #[default]
    Unresolved,
    /// The photo has no coordinate. Terminal; never receives a region.
    NoCoordinate,
    /// Grouped into a spatial bucket, awaiting resolution.
    Bucketed(BucketKey),
    /// Resolved to a reference region. Terminal.
    Resolved(Arc<Region>),
}

impl RegionStatus {
    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::NoCoordinate | Self::Resolved(_))
    }
}

/// Attempted to move a photo's status backwards or sideways.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Photo {id}: cannot move from {from} to {to}")]
pub struct StatusTransitionError {
    /// Photo whose status was being changed.
    pub id: PhotoId,
    /// Current status name.
    pub from: String,
    /// Requested status name.
    pub to: &'static str,
}

/// A photo with an optional coordinate and its resolution status.
///
/// Serializable for output; never deserialized, so the status can only be
/// changed through the `mark_*` transitions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRecord {
    id: PhotoId,
    coordinate: Option<Coordinate>,
    status: RegionStatus,
}

impl PhotoRecord {
    /// Creates an [`RegionStatus::Unresolved`] record.
    #[must_use]
    pub fn new(id: impl Into<PhotoId>, coordinate: Option<Coordinate>) -> Self {
        Self {
            id: id.into(),
            coordinate,
            status: RegionStatus::Unresolved,
        }
    }

    /// The photo identifier.
    #[must_use]
    pub const fn id(&self) -> &PhotoId {
        &self.id
    }

    /// The raw coordinate, if the photo has one.
    #[must_use]
    pub const fn coordinate(&self) -> Option<&Coordinate> {
        self.coordinate.as_ref()
    }

    /// Current resolution status.
    #[must_use]
    pub const fn status(&self) -> &RegionStatus {
        &self.status
    }

    /// The resolved region, if any.
    #[must_use]
    pub const fn region(&self) -> Option<&Arc<Region>> {
        match &self.status {
            RegionStatus::Resolved(region) => Some(region),
            _ => None,
        }
    }

    /// Marks the photo as having no coordinate.
    ///
    /// # Errors
    ///
    /// Fails unless the record is [`RegionStatus::Unresolved`].
    pub fn mark_no_coordinate(&mut self) -> Result<(), StatusTransitionError> {
        match self.status {
            RegionStatus::Unresolved => {
                self.status = RegionStatus::NoCoordinate;
                Ok(())
            }
            _ => Err(self.transition_error("no_coordinate")),
        }
    }

    /// Assigns the photo to a spatial bucket.
    ///
    /// # Errors
    ///
    /// Fails unless the record is [`RegionStatus::Unresolved`].
    pub fn mark_bucketed(&mut self, key: BucketKey) -> Result<(), StatusTransitionError> {
        match self.status {
            RegionStatus::Unresolved => {
                self.status = RegionStatus::Bucketed(key);
                Ok(())
            }
            _ => Err(self.transition_error("bucketed")),
        }
    }

    /// Stamps the resolved region onto the photo.
    ///
    /// # Errors
    ///
    /// Fails unless the record is [`RegionStatus::Bucketed`].
    pub fn mark_resolved(&mut self, region: Arc<Region>) -> Result<(), StatusTransitionError> {
        match self.status {
            RegionStatus::Bucketed(_) => {
                self.status = RegionStatus::Resolved(region);
                Ok(())
            }
            _ => Err(self.transition_error("resolved")),
        }
    }

    fn transition_error(&self, to: &'static str) -> StatusTransitionError {
        StatusTransitionError {
            id: self.id.clone(),
            from: self.status.as_ref().to_string(),
            to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn austin() -> Arc<Region> {
        Arc::new(Region {
            name: "Austin".to_string(),
            latitude: 30.27,
            longitude: -97.74,
            country_code: "US".to_string(),
            province_code: "TX".to_string(),
            country_name: "United States".to_string(),
            province_name: Some("Texas".to_string()),
        })
    }

    fn located(id: &str) -> PhotoRecord {
        PhotoRecord::new(id, Some(Coordinate::new(30.3, -97.7).unwrap()))
    }

    #[test]
    fn forward_path_through_bucket() {
        let mut photo = located("a");
        assert_eq!(photo.status(), &RegionStatus::Unresolved);

        photo.mark_bucketed(BucketKey::new("9v6k")).unwrap();
        assert_eq!(photo.status(), &RegionStatus::Bucketed(BucketKey::new("9v6k")));
        assert!(photo.region().is_none());

        photo.mark_resolved(austin()).unwrap();
        assert_eq!(photo.region().map(|r| r.name.as_str()), Some("Austin"));
        assert!(photo.status().is_terminal());
    }

    #[test]
    fn no_coordinate_is_terminal() {
        let mut photo = PhotoRecord::new("b", None);
        photo.mark_no_coordinate().unwrap();

        let err = photo.mark_bucketed(BucketKey::new("9v6k")).unwrap_err();
        assert_eq!(err.from, "no_coordinate");
        assert_eq!(err.to, "bucketed");

        assert!(photo.mark_resolved(austin()).is_err());
        assert_eq!(photo.status(), &RegionStatus::NoCoordinate);
    }

    #[test]
    fn cannot_resolve_without_bucket() {
        let mut photo = located("c");
        let err = photo.mark_resolved(austin()).unwrap_err();
        assert_eq!(err.from, "unresolved");
        assert_eq!(photo.status(), &RegionStatus::Unresolved);
    }

    #[test]
    fn resolved_never_regresses() {
        let mut photo = located("d");
        photo.mark_bucketed(BucketKey::new("9v6k")).unwrap();
        photo.mark_resolved(austin()).unwrap();

        assert!(photo.mark_bucketed(BucketKey::new("9v6m")).is_err());
        assert!(photo.mark_no_coordinate().is_err());
        assert!(photo.mark_resolved(austin()).is_err());
    }

    #[test]
    fn serializes_status_tagged() {
        let mut photo = located("e");
        photo.mark_bucketed(BucketKey::new("9v6")).unwrap();

        let json = serde_json::to_value(&photo).unwrap();
        assert_eq!(json["id"], "e");
        assert_eq!(json["status"]["kind"], "bucketed");
        assert_eq!(json["status"]["value"], "9v6");
        assert_eq!(json["coordinate"]["latitude"], 30.3);
    }

    #[test]
    fn bucket_key_reports_precision() {
        assert_eq!(BucketKey::new("9v6kn").precision(), 5);
        assert_eq!(BucketKey::new("9v6kn").to_string(), "9v6kn");
    }
}
