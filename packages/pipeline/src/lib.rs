#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Concurrent resolution of a photo library to reference regions.
//!
//! A run moves through `ready -> started -> loaded -> hashed ->
//! processed* -> complete` (or `failed`). [`run::resolve_library`] drives
//! the whole run from a [`PhotoSource`]; [`pipeline::ResolutionPipeline`]
//! handles the concurrent part once photos are bucketed.
//!
//! [`PhotoSource`]: photo_regions_photo::PhotoSource

pub mod config;
pub mod pipeline;
pub mod progress;
pub mod run;

use photo_regions_bucket::{BucketError, ResolveError};
use photo_regions_photo::PhotoSourceError;
use photo_regions_photo_models::BucketKey;
use photo_regions_region::{RegionIndexError, RegionTableError};

pub use config::{ConfigError, ResolveConfig};
pub use pipeline::{CancelToken, PipelineHandle, Resolution, ResolutionPipeline};
pub use progress::{ProgressReporter, ProgressState, TransitionError};
pub use run::resolve_library;

/// Errors that end a resolution run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The reference table could not be loaded.
    #[error(transparent)]
    Table(#[from] RegionTableError),

    /// The region index could not be built.
    #[error(transparent)]
    Index(#[from] RegionIndexError),

    /// The photo source could not be enumerated.
    #[error(transparent)]
    Source(#[from] PhotoSourceError),

    /// Photos could not be bucketed.
    #[error(transparent)]
    Bucket(#[from] BucketError),

    /// A bucket could not be resolved.
    #[error("Failed to resolve bucket {key}: {source}")]
    Resolve {
        /// Key of the failing bucket.
        key: BucketKey,
        /// Underlying error.
        #[source]
        source: ResolveError,
    },

    /// A resolution worker panicked or was aborted.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The run was cancelled before every bucket was resolved.
    #[error("resolution cancelled")]
    Cancelled,

    /// The progress state machine rejected a transition.
    #[error(transparent)]
    Progress(#[from] TransitionError),

    /// Invalid run configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
