//! Partitioning of photos into geohash buckets.

use std::collections::BTreeMap;

use photo_regions_photo_models::{BucketKey, PhotoRecord};

use crate::BucketError;
use crate::cell::{Precision, encode};

/// Photos split into a no-coordinate set and one group per occupied cell.
///
/// Every coordinate-bearing photo is in exactly one bucket; every other
/// photo is in the no-coordinate set. Groups keep input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoPartition {
    precision: Precision,
    no_coordinate: Vec<PhotoRecord>,
    buckets: BTreeMap<BucketKey, Vec<PhotoRecord>>,
}

impl PhotoPartition {
    /// Precision the partition was built with.
    #[must_use]
    pub const fn precision(&self) -> Precision {
        self.precision
    }

    /// Photos without a coordinate.
    #[must_use]
    pub fn no_coordinate(&self) -> &[PhotoRecord] {
        &self.no_coordinate
    }

    /// Photo groups keyed by cell.
    #[must_use]
    pub const fn buckets(&self) -> &BTreeMap<BucketKey, Vec<PhotoRecord>> {
        &self.buckets
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of photos with a coordinate.
    #[must_use]
    pub fn bucketed_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Number of photos in the partition.
    #[must_use]
    pub fn total(&self) -> usize {
        self.no_coordinate.len() + self.bucketed_count()
    }

    /// Splits into the no-coordinate set and the bucket groups.
    #[must_use]
    pub fn into_parts(self) -> (Vec<PhotoRecord>, BTreeMap<BucketKey, Vec<PhotoRecord>>) {
        (self.no_coordinate, self.buckets)
    }

    /// Reassembles a partition from parts produced by [`Self::into_parts`].
    ///
    /// Records are taken as they are; their statuses are not re-checked
    /// against the keys they are filed under.
    #[must_use]
    pub const fn from_parts(
        precision: Precision,
        no_coordinate: Vec<PhotoRecord>,
        buckets: BTreeMap<BucketKey, Vec<PhotoRecord>>,
    ) -> Self {
        Self {
            precision,
            no_coordinate,
            buckets,
        }
    }
}

/// Partitions `records` into geohash buckets at `precision`.
///
/// Records without a coordinate are marked `no_coordinate`; the rest are
/// marked `bucketed(key)` and appended to their key's group.
///
/// # Errors
///
/// * [`BucketError::Transition`] if a record is not `unresolved`
/// * [`BucketError::Encode`] if a coordinate cannot be encoded
pub fn bucket(records: Vec<PhotoRecord>, precision: Precision) -> Result<PhotoPartition, BucketError> {
    let mut no_coordinate = Vec::new();
    let mut buckets: BTreeMap<BucketKey, Vec<PhotoRecord>> = BTreeMap::new();

    for mut record in records {
        let Some(coord) = record.coordinate().copied() else {
            record.mark_no_coordinate()?;
            no_coordinate.push(record);
            continue;
        };

        let key = encode(&coord, precision)?;
        record.mark_bucketed(key.clone())?;
        buckets.entry(key).or_default().push(record);
    }

    log::debug!(
        "Bucketed photos at precision {precision}: {} cells, {} without coordinates",
        buckets.len(),
        no_coordinate.len()
    );

    Ok(PhotoPartition {
        precision,
        no_coordinate,
        buckets,
    })
}
