//! In-memory photo source, for tests and for callers that already hold the
//! photo listing.

use photo_regions_photo_models::{PhotoId, PhotoRecord};
use photo_regions_region_models::Coordinate;

use crate::{PhotoSource, PhotoSourceError, ensure_unique_ids};

/// A fixed list of `(id, coordinate)` pairs.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: Vec<(PhotoId, Option<Coordinate>)>,
}

impl MemorySource {
    /// Creates a source from `(id, coordinate)` pairs, preserving order.
    #[must_use]
    pub fn new(entries: Vec<(PhotoId, Option<Coordinate>)>) -> Self {
        Self { entries }
    }

    /// Appends a photo.
    #[must_use]
    pub fn with_photo(mut self, id: impl Into<PhotoId>, coordinate: Option<Coordinate>) -> Self {
        self.entries.push((id.into(), coordinate));
        self
    }

    /// Number of photos.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the source holds no photos.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PhotoSource for MemorySource {
    fn describe(&self) -> String {
        format!("in-memory listing ({} photos)", self.entries.len())
    }

    fn photos(&self) -> Result<Vec<PhotoRecord>, PhotoSourceError> {
        let photos: Vec<PhotoRecord> = self
            .entries
            .iter()
            .map(|(id, coord)| PhotoRecord::new(id.clone(), *coord))
            .collect();
        ensure_unique_ids(&photos)?;
        Ok(photos)
    }
}
