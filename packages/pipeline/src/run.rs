//! End-to-end resolution run driver.

use std::sync::Arc;

use photo_regions_bucket::{PhotoPartition, bucket};
use photo_regions_photo::PhotoSource;
use photo_regions_region::RegionIndex;

use crate::config::ResolveConfig;
use crate::pipeline::{CancelToken, Resolution, ResolutionPipeline};
use crate::PipelineError;
use crate::progress::ProgressReporter;

/// Runs a full resolution of `source` against `index`.
///
/// Drives `reporter` through `started -> loaded -> hashed -> processed* ->
/// complete`. Enumeration and bucketing happen sequentially on the calling
/// task; bucket resolution fans out over `config.workers` workers.
///
/// # Errors
///
/// * [`PipelineError::Source`] if the photo source cannot be enumerated
/// * [`PipelineError::Bucket`] if bucketing fails
/// * any error of [`ResolutionPipeline::run`]
///
/// On error after the run started, `reporter` is left `failed`.
pub async fn resolve_library(
    source: &dyn PhotoSource,
    index: Arc<RegionIndex>,
    config: &ResolveConfig,
    reporter: &ProgressReporter,
    cancel: &CancelToken,
) -> Result<Resolution, PipelineError> {
    reporter.start()?;
    log::info!("Enumerating photos from {}", source.describe());

    let partition = match prepare(source, config, reporter) {
        Ok(partition) => partition,
        Err(e) => {
            if let Err(transition) = reporter.fail(e.to_string()) {
                log::warn!("Could not record failure: {transition}");
            }
            log::error!("Resolution failed before dispatch: {e}");
            return Err(e);
        }
    };

    log::info!(
        "Partitioned {} photos into {} buckets at precision {} ({} without coordinates)",
        partition.total(),
        partition.bucket_count(),
        partition.precision(),
        partition.no_coordinate().len()
    );

    ResolutionPipeline::new(index, config.workers)
        .run(partition, reporter, cancel)
        .await
}

fn prepare(
    source: &dyn PhotoSource,
    config: &ResolveConfig,
    reporter: &ProgressReporter,
) -> Result<PhotoPartition, PipelineError> {
    let photos = source.photos()?;
    reporter.loaded(photos.len())?;
    log::info!("Loaded {} photos", photos.len());

    let partition = bucket(photos, config.precision)?;
    reporter.hashed(partition.bucket_count())?;
    Ok(partition)
}
