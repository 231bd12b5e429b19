#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Region reference table loading and nearest-region lookup.
//!
//! The reference table is loaded once at startup into a [`RegionTable`],
//! then turned into an immutable [`RegionIndex`] that answers
//! nearest-region queries from any number of concurrent readers.
//!
//! # Usage
//!
//! ```rust,no_run
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use photo_regions_region::{RegionIndex, RegionTable};
//! use photo_regions_region_models::Coordinate;
//!
//! let table = RegionTable::load("data/regions.tsv".as_ref())?;
//! let index = RegionIndex::build(table)?;
//! let region = index.nearest(&Coordinate::new(30.30, -97.70)?);
//! println!("{}", region.label());
//! # Ok(())
//! # }
//! ```

pub mod index;
pub mod table;

pub use index::RegionIndex;
pub use photo_regions_region_models::{Coordinate, CoordinateError, Region};
pub use table::RegionTable;

/// Errors from loading the reference table.
///
/// All of these are fatal to a resolution run; there is no partial-table
/// fallback.
#[derive(Debug, thiserror::Error)]
pub enum RegionTableError {
    /// The table file does not exist.
    #[error("Region reference table not found: {path}")]
    MissingReferenceTable {
        /// Path that was looked up.
        path: String,
    },

    /// The table exists but could not be read.
    #[error("Failed to read region reference table {path}: {source}")]
    UnreadableReferenceTable {
        /// Path (or label) of the table.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The table contained no rows.
    #[error("Region reference table is empty")]
    EmptyReferenceTable,

    /// A row failed the column contract.
    #[error("Malformed region row at line {line}: {reason}")]
    MalformedRow {
        /// 1-based line number.
        line: u64,
        /// What was wrong with the row.
        reason: String,
    },
}

/// Errors from building a [`RegionIndex`].
#[derive(Debug, thiserror::Error)]
pub enum RegionIndexError {
    /// The index cannot answer queries without at least one region.
    #[error("Cannot build a region index from an empty table")]
    EmptyRegionTable,
}
