//! Concurrent bucket resolution.
//!
//! Each occupied bucket is resolved on the blocking thread pool, with at
//! most `workers` buckets in flight. Completed buckets are funneled back to
//! a single consumer loop, which is the only writer of the `located`
//! counter and the merged result map. Progress is reported after every
//! completion.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use photo_regions_bucket::{PhotoPartition, ResolvedBucket, resolve};
use photo_regions_photo_models::{BucketKey, PhotoId, PhotoRecord};
use photo_regions_region::RegionIndex;
use photo_regions_region_models::Region;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};

use crate::PipelineError;
use crate::progress::{ProgressReporter, ProgressState};

/// Cooperative cancellation flag shared between a run and its controller.
///
/// Cancelling stops new buckets from being submitted. Buckets already in
/// flight finish, then the run fails with [`PipelineError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Merged result of a completed run.
///
/// Ordering is deterministic regardless of task interleaving: photos
/// without a coordinate first (input order), then buckets by key (input
/// order within a bucket).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    no_coordinate: Vec<PhotoRecord>,
    buckets: BTreeMap<BucketKey, ResolvedBucket>,
}

impl Resolution {
    /// All photos in deterministic order.
    pub fn photos(&self) -> impl Iterator<Item = &PhotoRecord> {
        self.no_coordinate
            .iter()
            .chain(self.buckets.values().flat_map(|b| b.photos.iter()))
    }

    /// Consumes the resolution, returning all photos in deterministic order.
    #[must_use]
    pub fn into_photos(self) -> Vec<PhotoRecord> {
        let mut photos = self.no_coordinate;
        for bucket in self.buckets.into_values() {
            photos.extend(bucket.photos);
        }
        photos
    }

    /// Resolved buckets ordered by key.
    pub fn buckets(&self) -> impl Iterator<Item = &ResolvedBucket> {
        self.buckets.values()
    }

    /// Number of photos without a coordinate.
    #[must_use]
    pub fn no_located(&self) -> usize {
        self.no_coordinate.len()
    }

    /// Number of photos assigned a region.
    #[must_use]
    pub fn located(&self) -> usize {
        self.buckets.values().map(|b| b.photos.len()).sum()
    }

    /// Number of photos in the run.
    #[must_use]
    pub fn total(&self) -> usize {
        self.no_located() + self.located()
    }

    /// Number of resolved buckets.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Photo count per region name.
    #[must_use]
    pub fn region_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for bucket in self.buckets.values() {
            *counts.entry(bucket.region.name.clone()).or_insert(0) += bucket.photos.len();
        }
        counts
    }

    /// Region assigned to `id`, if the photo exists and was located.
    #[must_use]
    pub fn region_of(&self, id: &PhotoId) -> Option<&Arc<Region>> {
        self.buckets
            .values()
            .find(|b| b.photos.iter().any(|p| p.id() == id))
            .map(|b| &b.region)
    }
}

/// Resolves a bucketed photo partition against a shared [`RegionIndex`].
pub struct ResolutionPipeline {
    index: Arc<RegionIndex>,
    workers: usize,
}

impl std::fmt::Debug for ResolutionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionPipeline")
            .field("regions", &self.index.len())
            .field("workers", &self.workers)
            .finish()
    }
}

impl ResolutionPipeline {
    /// Creates a pipeline with at most `workers` buckets in flight (at
    /// least one).
    #[must_use]
    pub fn new(index: Arc<RegionIndex>, workers: usize) -> Self {
        Self {
            index,
            workers: workers.max(1),
        }
    }

    /// Worker pool size.
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Resolves every bucket of `partition`.
    ///
    /// `reporter` must already be `hashed`. On success it ends `complete`;
    /// on any error it ends `failed` with the error message.
    ///
    /// # Errors
    ///
    /// * [`PipelineError::Resolve`] if a bucket fails to resolve
    /// * [`PipelineError::Join`] if a worker panics
    /// * [`PipelineError::Cancelled`] if `cancel` fired before every bucket
    ///   was submitted
    /// * [`PipelineError::Progress`] if `reporter` was not `hashed`
    pub async fn run(
        &self,
        partition: PhotoPartition,
        reporter: &ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<Resolution, PipelineError> {
        match self.resolve_all(partition, reporter, cancel).await {
            Ok(resolution) => {
                log::info!(
                    "Resolved {} photos in {} buckets ({} without coordinates)",
                    resolution.located(),
                    resolution.bucket_count(),
                    resolution.no_located()
                );
                Ok(resolution)
            }
            Err(e) => {
                if let Err(transition) = reporter.fail(e.to_string()) {
                    log::warn!("Could not record failure: {transition}");
                }
                log::error!("Resolution failed: {e}");
                Err(e)
            }
        }
    }

    /// Spawns [`Self::run`] onto the current tokio runtime and returns a
    /// handle for observing, cancelling and awaiting it.
    ///
    /// `reporter` must already be `hashed`.
    #[must_use]
    pub fn start(self, partition: PhotoPartition, reporter: Arc<ProgressReporter>) -> PipelineHandle {
        let cancel = CancelToken::new();
        let task_cancel = cancel.clone();
        let task_reporter = Arc::clone(&reporter);

        let task = tokio::spawn(async move {
            self.run(partition, &task_reporter, &task_cancel).await
        });

        PipelineHandle {
            reporter,
            cancel,
            task,
        }
    }

    async fn resolve_all(
        &self,
        partition: PhotoPartition,
        reporter: &ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<Resolution, PipelineError> {
        let total = partition.total();
        let (no_coordinate, buckets) = partition.into_parts();
        let no_located = no_coordinate.len();

        if buckets.is_empty() {
            reporter.processed(no_located, 0, total)?;
            return Ok(Resolution {
                no_coordinate,
                buckets: BTreeMap::new(),
            });
        }

        let mut pending = buckets.into_iter().peekable();
        let mut tasks: JoinSet<Result<ResolvedBucket, PipelineError>> = JoinSet::new();
        let mut resolved = BTreeMap::new();
        let mut located = 0;

        loop {
            while tasks.len() < self.workers && pending.peek().is_some() && !cancel.is_cancelled()
            {
                let Some((key, group)) = pending.next() else {
                    break;
                };
                let index = Arc::clone(&self.index);
                tasks.spawn_blocking(move || {
                    resolve(&index, key.clone(), group)
                        .map_err(|source| PipelineError::Resolve { key, source })
                });
            }

            let Some(joined) = tasks.join_next().await else {
                break;
            };

            let bucket = match joined.map_err(PipelineError::from).and_then(|r| r) {
                Ok(bucket) => bucket,
                Err(e) => {
                    tasks.shutdown().await;
                    return Err(e);
                }
            };

            located += bucket.photos.len();
            log::debug!(
                "Bucket {} ({} photos) -> {}",
                bucket.key,
                bucket.photos.len(),
                bucket.region.label()
            );

            reporter.processed(no_located, located, total)?;
            resolved.insert(bucket.key.clone(), bucket);
        }

        if pending.peek().is_some() {
            log::warn!(
                "Resolution cancelled with {} buckets unresolved",
                pending.count()
            );
            return Err(PipelineError::Cancelled);
        }

        Ok(Resolution {
            no_coordinate,
            buckets: resolved,
        })
    }
}

/// A resolution run spawned by [`ResolutionPipeline::start`].
#[derive(Debug)]
pub struct PipelineHandle {
    reporter: Arc<ProgressReporter>,
    cancel: CancelToken,
    task: JoinHandle<Result<Resolution, PipelineError>>,
}

impl PipelineHandle {
    /// Current progress state.
    #[must_use]
    pub fn state(&self) -> ProgressState {
        self.reporter.current()
    }

    /// Subscribes to progress state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ProgressState> {
        self.reporter.subscribe()
    }

    /// Requests cooperative cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the run to finish.
    ///
    /// # Errors
    ///
    /// Returns the run's [`PipelineError`], or [`PipelineError::Join`] if
    /// the run task itself panicked.
    pub async fn join(self) -> Result<Resolution, PipelineError> {
        self.task.await?
    }
}
