//! Nearest-region lookup over the reference table.
//!
//! Distance is planar Euclidean distance in degree-space, not great-circle
//! distance. Candidates come from an R-tree; among regions at exactly the
//! minimal distance the one that appears first in the table wins.

use std::sync::Arc;

use photo_regions_region_models::{Coordinate, Region};
use rstar::RTree;
use rstar::primitives::GeomWithData;

use crate::RegionIndexError;
use crate::table::RegionTable;

/// A region centroid in the R-tree, tagged with its table position.
type IndexedCentroid = GeomWithData<[f64; 2], usize>;

/// Immutable nearest-region index.
///
/// Built once from a [`RegionTable`] and shared read-only (typically behind
/// an [`Arc`]) across every resolution task.
pub struct RegionIndex {
    regions: Vec<Arc<Region>>,
    tree: RTree<IndexedCentroid>,
}

impl RegionIndex {
    /// Builds the index from a table.
    ///
    /// # Errors
    ///
    /// Returns [`RegionIndexError::EmptyRegionTable`] if the table has no
    /// rows.
    pub fn build(table: RegionTable) -> Result<Self, RegionIndexError> {
        if table.is_empty() {
            return Err(RegionIndexError::EmptyRegionTable);
        }

        let regions: Vec<Arc<Region>> = table.into_regions().into_iter().map(Arc::new).collect();
        let centroids = regions
            .iter()
            .enumerate()
            .map(|(i, r)| GeomWithData::new([r.latitude, r.longitude], i))
            .collect();
        let tree = RTree::bulk_load(centroids);

        log::debug!("Built region index over {} regions", regions.len());

        Ok(Self { regions, tree })
    }

    /// Returns the region whose centroid is closest to `coord`.
    ///
    /// Ties are broken by table order: the earliest region wins.
    #[must_use]
    pub fn nearest(&self, coord: &Coordinate) -> &Arc<Region> {
        let query = [coord.latitude(), coord.longitude()];

        let mut best = 0;
        let mut best_distance: Option<f64> = None;

        for (entry, distance) in self.tree.nearest_neighbor_iter_with_distance_2(&query) {
            match best_distance {
                None => {
                    best = entry.data;
                    best_distance = Some(distance);
                }
                Some(d) if distance > d => break,
                Some(_) => best = best.min(entry.data),
            }
        }

        &self.regions[best]
    }

    /// Number of indexed regions. Never zero.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the index holds no regions. Never true for a built index.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Indexed regions in table order.
    #[must_use]
    pub fn regions(&self) -> &[Arc<Region>] {
        &self.regions
    }
}

impl std::fmt::Debug for RegionIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionIndex")
            .field("regions", &self.regions.len())
            .finish_non_exhaustive()
    }
}
