//! Resolution of one bucket to its nearest reference region.

use std::sync::Arc;

use photo_regions_photo_models::{BucketKey, PhotoRecord};
use photo_regions_region::RegionIndex;
use photo_regions_region_models::Region;

use crate::ResolveError;
use crate::cell::center;

/// A bucket after resolution: every photo carries the same region.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBucket {
    /// Cell key.
    pub key: BucketKey,
    /// Region assigned to the whole cell.
    pub region: Arc<Region>,
    /// The cell's photos, now `resolved(region)`, in input order.
    pub photos: Vec<PhotoRecord>,
}

/// Resolves a bucket with one nearest-region query at the cell center.
///
/// Only `group` is touched; no shared state is mutated, so buckets can be
/// resolved in parallel against a shared index.
///
/// # Errors
///
/// * [`ResolveError::Bucket`] if `key` does not decode
/// * [`ResolveError::Transition`] if a photo is not `bucketed`
pub fn resolve(
    index: &RegionIndex,
    key: BucketKey,
    mut group: Vec<PhotoRecord>,
) -> Result<ResolvedBucket, ResolveError> {
    let representative = center(&key)?;
    let region = Arc::clone(index.nearest(&representative));

    for photo in &mut group {
        photo.mark_resolved(Arc::clone(&region))?;
    }

    log::trace!(
        "Resolved cell {key} ({} photos) to {}",
        group.len(),
        region.label()
    );

    Ok(ResolvedBucket {
        key,
        region,
        photos: group,
    })
}

#[cfg(test)]
mod tests {
    use photo_regions_photo_models::RegionStatus;
    use photo_regions_region::RegionTable;
    use photo_regions_region_models::Coordinate;

    use super::*;
    use crate::bucketer::bucket;
    use crate::cell::Precision;

    fn region(name: &str, latitude: f64, longitude: f64) -> Region {
        Region {
            name: name.to_string(),
            latitude,
            longitude,
            country_code: "US".to_string(),
            province_code: String::new(),
            country_name: "United States".to_string(),
            province_name: None,
        }
    }

    fn index() -> RegionIndex {
        RegionIndex::build(RegionTable::new(vec![
            region("Austin", 30.27, -97.74),
            region("Denver", 39.74, -104.99),
        ]))
        .unwrap()
    }

    fn photo(id: &str, coord: Option<(f64, f64)>) -> PhotoRecord {
        PhotoRecord::new(
            id,
            coord.map(|(lat, lng)| Coordinate::new(lat, lng).unwrap()),
        )
    }

    #[test]
    fn shared_cell_gets_one_region() {
        let index = index();
        let partition = bucket(
            vec![
                photo("a", Some((30.30, -97.70))),
                photo("b", Some((30.25, -97.80))),
                photo("c", None),
            ],
            Precision::new(3).unwrap(),
        )
        .unwrap();
        assert_eq!(partition.bucket_count(), 1);

        let (no_coordinate, buckets) = partition.into_parts();
        let (key, group) = buckets.into_iter().next().unwrap();
        let resolved = resolve(&index, key, group).unwrap();

        assert_eq!(resolved.region.name, "Austin");
        assert_eq!(resolved.photos.len(), 2);
        for p in &resolved.photos {
            assert!(Arc::ptr_eq(p.region().unwrap(), &resolved.region));
        }

        assert_eq!(no_coordinate[0].status(), &RegionStatus::NoCoordinate);
        assert!(no_coordinate[0].region().is_none());
    }

    #[test]
    fn uses_cell_center_not_photo_coordinate() {
        // Photo sits right next to Denver, but the precision-1 cell "9"
        // is centered at (22.5, -112.5), which is closer to Austin.
        let index = index();
        let partition = bucket(
            vec![photo("a", Some((39.74, -104.99)))],
            Precision::new(1).unwrap(),
        )
        .unwrap();

        let (_, buckets) = partition.into_parts();
        let (key, group) = buckets.into_iter().next().unwrap();
        assert_eq!(key.as_str(), "9");

        let resolved = resolve(&index, key, group).unwrap();
        assert_eq!(resolved.region.name, "Austin");
    }

    #[test]
    fn invalid_key_fails() {
        let result = resolve(&index(), BucketKey::new("!!"), Vec::new());
        assert!(matches!(result, Err(ResolveError::Bucket(_))));
    }

    #[test]
    fn unbucketed_photo_fails() {
        let result = resolve(
            &index(),
            BucketKey::new("9v6"),
            vec![photo("a", Some((30.3, -97.7)))],
        );
        assert!(matches!(result, Err(ResolveError::Transition(_))));
    }

    fn resolve_single(index: &RegionIndex, latitude: f64, longitude: f64) -> ResolvedBucket {
        let partition = bucket(
            vec![photo("a", Some((latitude, longitude)))],
            Precision::DEFAULT,
        )
        .unwrap();
        let (_, buckets) = partition.into_parts();
        let (key, group) = buckets.into_iter().next().unwrap();
        resolve(index, key, group).unwrap()
    }

    #[test]
    fn north_pole_resolves_to_arctic() {
        let index = RegionIndex::build(RegionTable::new(vec![
            region("Antarctic", -89.0, 0.0),
            region("Arctic", 89.0, 0.0),
        ]))
        .unwrap();

        assert_eq!(resolve_single(&index, 90.0, 0.0).region.name, "Arctic");
        assert_eq!(resolve_single(&index, -90.0, 0.0).region.name, "Antarctic");
    }

    #[test]
    fn antimeridian_resolves_to_east() {
        let index = RegionIndex::build(RegionTable::new(vec![
            region("West", 0.0, -179.0),
            region("East", 0.0, 179.0),
        ]))
        .unwrap();

        assert_eq!(resolve_single(&index, 0.0, 180.0).region.name, "East");
        assert_eq!(resolve_single(&index, 0.0, -180.0).region.name, "West");
    }

    #[test]
    fn same_key_resolves_identically() {
        let index = index();
        let p = Precision::new(4).unwrap();
        let a = bucket(vec![photo("a", Some((39.70, -104.90)))], p).unwrap();
        let b = bucket(vec![photo("b", Some((39.71, -104.91)))], p).unwrap();

        let (_, a) = a.into_parts();
        let (_, b) = b.into_parts();
        let (ka, ga) = a.into_iter().next().unwrap();
        let (kb, gb) = b.into_iter().next().unwrap();
        assert_eq!(ka, kb);

        let ra = resolve(&index, ka, ga).unwrap();
        let rb = resolve(&index, kb, gb).unwrap();
        assert!(Arc::ptr_eq(&ra.region, &rb.region));
        assert_eq!(ra.region.name, "Denver");
    }
}
