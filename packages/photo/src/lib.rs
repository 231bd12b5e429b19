#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Photo library enumeration sources.
//!
//! A [`PhotoSource`] yields the ordered, finite collection of photos for one
//! resolution run. Every record comes back [`RegionStatus::Unresolved`];
//! bucketing and resolution happen downstream.
//!
//! [`RegionStatus::Unresolved`]: photo_regions_photo_models::RegionStatus::Unresolved

pub mod memory;
pub mod tsv;

pub use memory::MemorySource;
pub use photo_regions_photo_models::{PhotoId, PhotoRecord};
pub use tsv::TsvPhotoSource;

/// Errors from enumerating a photo source. Any of these aborts the run
/// before bucketing begins.
#[derive(Debug, thiserror::Error)]
pub enum PhotoSourceError {
    /// The photo listing does not exist.
    #[error("Photo listing not found: {path}")]
    Missing {
        /// Path that was looked up.
        path: String,
    },

    /// The listing exists but could not be read.
    #[error("Failed to read photo listing {path}: {source}")]
    Unreadable {
        /// Path of the listing.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A row could not be turned into a photo record.
    #[error("Malformed photo row at line {line}: {reason}")]
    MalformedRow {
        /// 1-based line number.
        line: u64,
        /// What was wrong with the row.
        reason: String,
    },

    /// Two photos share an identifier.
    #[error("Duplicate photo id: {0}")]
    DuplicateId(PhotoId),
}

/// An ordered, finite, read-only enumeration of photos.
///
/// Enumerated exactly once per resolution run.
pub trait PhotoSource: Send + Sync {
    /// Short description used in log output.
    fn describe(&self) -> String;

    /// Enumerates every photo, in source order.
    ///
    /// # Errors
    ///
    /// Returns [`PhotoSourceError`] if the source cannot be read or
    /// contains invalid rows.
    fn photos(&self) -> Result<Vec<PhotoRecord>, PhotoSourceError>;
}

/// Rejects repeated identifiers.
///
/// # Errors
///
/// Returns [`PhotoSourceError::DuplicateId`] for the first repeated id.
pub fn ensure_unique_ids(photos: &[PhotoRecord]) -> Result<(), PhotoSourceError> {
    let mut seen = std::collections::BTreeSet::new();
    for photo in photos {
        if !seen.insert(photo.id()) {
            return Err(PhotoSourceError::DuplicateId(photo.id().clone()));
        }
    }
    Ok(())
}
