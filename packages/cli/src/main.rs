#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for photo region resolution.
//!
//! Loads the reference region table, resolves a photo listing to regions
//! through the bucketed pipeline and prints the assignments. Also exposes
//! single-coordinate lookups and table statistics.
//!
//! Progress is rendered from the run's state stream by
//! [`photo_regions_cli_utils::spawn_state_bar`]; `log` output goes through
//! the same `indicatif::MultiProgress`.

mod output;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use photo_regions_bucket::Precision;
use photo_regions_cli_utils::{MultiProgress, paths, spawn_state_bar};
use photo_regions_photo::TsvPhotoSource;
use photo_regions_pipeline::{CancelToken, ProgressReporter, ResolveConfig, resolve_library};
use photo_regions_region::{Coordinate, RegionIndex, RegionTable};

// ---------------------------------------------------------------------------
// CLI definitions
// ---------------------------------------------------------------------------

/// Assign regions to photos by nearest reference region.
#[derive(Parser)]
#[command(name = "photo_regions")]
#[command(about = "Assign regions to photos by nearest reference region")]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Resolve every photo in a listing to its region.
    Resolve {
        /// Photo listing (`id \t latitude \t longitude` per line).
        #[arg(long)]
        photos: PathBuf,

        /// Reference region table (default: the bundled `data/regions.tsv`).
        #[arg(long, env = "PHOTO_REGIONS_TABLE")]
        regions: Option<PathBuf>,

        /// Geohash precision used for bucketing (1-12).
        #[arg(long, env = "PHOTO_REGIONS_PRECISION")]
        precision: Option<Precision>,

        /// Maximum number of buckets resolved concurrently.
        #[arg(long, env = "PHOTO_REGIONS_WORKERS")]
        workers: Option<usize>,

        /// TOML config file with `precision` / `workers`.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print a JSON array instead of tab-separated lines.
        #[arg(long)]
        json: bool,
    },

    /// Print the region nearest to a coordinate.
    Nearest {
        /// Latitude in degrees.
        #[arg(allow_hyphen_values = true)]
        latitude: f64,

        /// Longitude in degrees.
        #[arg(allow_hyphen_values = true)]
        longitude: f64,

        /// Reference region table.
        #[arg(long, env = "PHOTO_REGIONS_TABLE")]
        regions: Option<PathBuf>,
    },

    /// Print reference table statistics.
    Regions {
        /// Reference region table.
        #[arg(long, env = "PHOTO_REGIONS_TABLE")]
        regions: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = photo_regions_cli_utils::init_logger("info");
    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            photos,
            regions,
            precision,
            workers,
            config,
            json,
        } => {
            let config = build_config(config.as_deref(), precision, workers)?;
            cmd_resolve(&multi, &photos, regions, &config, json).await
        }
        Commands::Nearest {
            latitude,
            longitude,
            regions,
        } => cmd_nearest(latitude, longitude, regions),
        Commands::Regions { regions } => cmd_regions(regions),
    }
}

/// Layers defaults, the optional config file, then flags (or their
/// environment fallbacks).
fn build_config(
    file: Option<&Path>,
    precision: Option<Precision>,
    workers: Option<usize>,
) -> Result<ResolveConfig, Box<dyn std::error::Error>> {
    let mut config = match file {
        Some(path) => ResolveConfig::load(path)?,
        None => ResolveConfig::default(),
    };

    if let Some(precision) = precision {
        config = config.with_precision(precision);
    }
    if let Some(workers) = workers {
        config = config.with_workers(workers)?;
    }

    log::debug!(
        "Using precision {} with {} workers",
        config.precision,
        config.workers
    );

    Ok(config)
}

fn load_index(regions: Option<PathBuf>) -> Result<RegionIndex, Box<dyn std::error::Error>> {
    let path = paths::regions_table(regions);
    Ok(RegionIndex::build(RegionTable::load(&path)?)?)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Resolves a photo listing and prints one assignment per photo.
async fn cmd_resolve(
    multi: &MultiProgress,
    photos: &Path,
    regions: Option<PathBuf>,
    config: &ResolveConfig,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let index = Arc::new(load_index(regions)?);
    let source = TsvPhotoSource::new(photos);
    let reporter = ProgressReporter::new();
    let bar = spawn_state_bar(multi, reporter.subscribe());

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted; finishing in-flight buckets");
            on_interrupt.cancel();
        }
    });

    let result = resolve_library(&source, index, config, &reporter, &cancel).await;
    bar.await?;
    let resolution = result?;

    log::info!("{}", reporter.current());
    for (region, count) in resolution.region_counts() {
        log::info!("  {region}: {count}");
    }

    let mut stdout = std::io::stdout().lock();
    if json {
        output::write_json(&mut stdout, &resolution)?;
    } else {
        output::write_tsv(&mut stdout, &resolution)?;
    }

    Ok(())
}

/// Prints the region nearest to a single coordinate.
fn cmd_nearest(
    latitude: f64,
    longitude: f64,
    regions: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let coordinate = Coordinate::new(latitude, longitude)?;
    let index = load_index(regions)?;
    let region = index.nearest(&coordinate);

    println!(
        "{}\t{:.4}\t{:.4}",
        region.label(),
        region.latitude,
        region.longitude
    );

    Ok(())
}

/// Prints a summary of the reference table.
fn cmd_regions(regions: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let path = paths::regions_table(regions);
    let table = RegionTable::load(&path)?;

    println!("=== Reference Regions ===");
    println!();
    println!("Table:     {}", path.display());
    println!("Regions:   {}", table.len());

    let countries = table.country_counts();
    println!("Countries: {}", countries.len());
    for (country, count) in &countries {
        println!("  {country:<24} {count}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn env_of(subcommand: &str, arg: &str) -> Option<String> {
        let cli = Cli::command();
        let sub = cli.find_subcommand(subcommand)?;
        let arg = sub.get_arguments().find(|a| a.get_id() == arg)?;
        arg.get_env().map(|env| env.to_string_lossy().into_owned())
    }

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_fall_back_to_environment() {
        assert_eq!(
            env_of("resolve", "precision").as_deref(),
            Some("PHOTO_REGIONS_PRECISION")
        );
        assert_eq!(
            env_of("resolve", "workers").as_deref(),
            Some("PHOTO_REGIONS_WORKERS")
        );
        for subcommand in ["resolve", "nearest", "regions"] {
            assert_eq!(
                env_of(subcommand, "regions").as_deref(),
                Some("PHOTO_REGIONS_TABLE")
            );
        }
    }

    #[test]
    fn flags_beat_config_file() {
        let path = std::env::temp_dir().join("photo_regions_cli_config_test.toml");
        std::fs::write(&path, "precision = 4\nworkers = 2\n").unwrap();

        let config = build_config(Some(path.as_path()), Some(Precision::new(6).unwrap()), None).unwrap();
        assert_eq!(config.precision.get(), 6);
        assert_eq!(config.workers, 2);

        let config = build_config(Some(path.as_path()), None, Some(3)).unwrap();
        assert_eq!(config.precision.get(), 4);
        assert_eq!(config.workers, 3);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_index_reads_bundled_table() {
        let index = load_index(None).unwrap();
        assert_eq!(index.len(), 27);
    }

    #[test]
    fn parses_resolve_flags() {
        let cli = Cli::try_parse_from([
            "photo_regions",
            "resolve",
            "--photos",
            "photos.tsv",
            "--regions",
            "regions.tsv",
            "--precision",
            "6",
            "--workers",
            "2",
        ])
        .unwrap();

        match cli.command {
            Commands::Resolve {
                photos,
                regions,
                precision,
                workers,
                ..
            } => {
                assert_eq!(photos, PathBuf::from("photos.tsv"));
                assert_eq!(regions, Some(PathBuf::from("regions.tsv")));
                assert_eq!(precision.map(Precision::get), Some(6));
                assert_eq!(workers, Some(2));
            }
            _ => panic!("expected resolve"),
        }
    }
}
