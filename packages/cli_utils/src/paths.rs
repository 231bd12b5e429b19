//! Canonical file paths for bundled data.
//!
//! All paths are relative to the project root's `data/` directory.

use std::path::{Path, PathBuf};

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`. Falls back to the
/// current directory if the crate is not laid out inside the workspace.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Returns the `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Returns the bundled reference region table.
#[must_use]
pub fn default_regions_table() -> PathBuf {
    data_dir().join("regions.tsv")
}

/// Picks the reference table: `explicit` if given, else the bundled table.
#[must_use]
pub fn regions_table(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(default_regions_table)
}
