//! Tab-separated region reference table loader.
//!
//! Each non-blank line is one region:
//!
//! ```text
//! id \t latitude \t longitude \t name \t country_code \t province_code [\t country_name [\t province_name]]
//! ```
//!
//! The first six columns are required. The country and province names may
//! be missing, in which case they degrade to an empty country name and no
//! province name.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use photo_regions_region_models::{Coordinate, Region};

use crate::RegionTableError;

/// Minimum number of columns a row must carry.
pub const REQUIRED_COLUMNS: usize = 6;

const COL_LATITUDE: usize = 1;
const COL_LONGITUDE: usize = 2;
const COL_NAME: usize = 3;
const COL_COUNTRY_CODE: usize = 4;
const COL_PROVINCE_CODE: usize = 5;
const COL_COUNTRY_NAME: usize = 6;
const COL_PROVINCE_NAME: usize = 7;

/// Ordered sequence of reference regions, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionTable {
    regions: Vec<Region>,
}

impl RegionTable {
    /// Wraps an already-built list of regions.
    #[must_use]
    pub const fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    /// Loads the table from a TSV file on disk.
    ///
    /// # Errors
    ///
    /// * [`RegionTableError::MissingReferenceTable`] if `path` does not exist
    /// * [`RegionTableError::UnreadableReferenceTable`] on any I/O failure
    /// * [`RegionTableError::MalformedRow`] if a row breaks the column contract
    /// * [`RegionTableError::EmptyReferenceTable`] if no rows were found
    pub fn load(path: &Path) -> Result<Self, RegionTableError> {
        let file = std::fs::File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RegionTableError::MissingReferenceTable {
                    path: path.display().to_string(),
                }
            } else {
                RegionTableError::UnreadableReferenceTable {
                    path: path.display().to_string(),
                    source: e,
                }
            }
        })?;

        let table = Self::from_reader(file, &path.display().to_string())?;
        log::info!(
            "Loaded {} regions from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    /// Parses the table from any reader. `label` names the source in errors.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`], minus the missing-file case.
    pub fn from_reader(mut reader: impl Read, label: &str) -> Result<Self, RegionTableError> {
        let unreadable = |source: std::io::Error| RegionTableError::UnreadableReferenceTable {
            path: label.to_string(),
            source,
        };

        let mut text = String::new();
        reader.read_to_string(&mut text).map_err(unreadable)?;

        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(text.as_bytes());

        let mut regions = Vec::new();
        let mut record = csv::StringRecord::new();

        while csv_reader
            .read_record(&mut record)
            .map_err(|e| unreadable(std::io::Error::from(e)))?
        {
            let byte = record.position().map_or(0, csv::Position::byte);
            regions.push(parse_row(&record, physical_line(&text, byte))?);
        }

        if regions.is_empty() {
            return Err(RegionTableError::EmptyReferenceTable);
        }

        Ok(Self { regions })
    }

    /// Number of regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the table has no regions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Regions in table order.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Consumes the table, returning the regions in table order.
    #[must_use]
    pub fn into_regions(self) -> Vec<Region> {
        self.regions
    }

    /// Number of regions per country code.
    #[must_use]
    pub fn country_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for region in &self.regions {
            *counts.entry(region.country_code.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// 1-based line of the record whose read started at `byte`.
///
/// The reader reports the position where it started looking, which is
/// before any blank lines it skipped, so those are stepped over here.
fn physical_line(text: &str, byte: u64) -> u64 {
    let start = usize::try_from(byte).map_or(text.len(), |b| b.min(text.len()));
    let rest = &text.as_bytes()[start..];
    let blank = rest.iter().take_while(|&&b| b == b'\n' || b == b'\r').count();
    let newlines = text.as_bytes()[..start + blank]
        .iter()
        .filter(|&&b| b == b'\n')
        .count();
    newlines as u64 + 1
}

/// Parses one table row. `line` is the 1-based line number for errors.
///
/// # Errors
///
/// Returns [`RegionTableError::MalformedRow`] if the row has fewer than
/// [`REQUIRED_COLUMNS`] columns or a coordinate does not parse.
pub fn parse_row(record: &csv::StringRecord, line: u64) -> Result<Region, RegionTableError> {
    if record.len() < REQUIRED_COLUMNS {
        return Err(RegionTableError::MalformedRow {
            line,
            reason: format!(
                "expected at least {REQUIRED_COLUMNS} columns, found {}",
                record.len()
            ),
        });
    }

    let field = |i: usize| record.get(i).unwrap_or_default();

    let latitude = parse_degrees(field(COL_LATITUDE), "latitude", line)?;
    let longitude = parse_degrees(field(COL_LONGITUDE), "longitude", line)?;

    Coordinate::new(latitude, longitude).map_err(|e| RegionTableError::MalformedRow {
        line,
        reason: e.to_string(),
    })?;

    let province_name = record
        .get(COL_PROVINCE_NAME)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string);

    Ok(Region {
        name: field(COL_NAME).to_string(),
        latitude,
        longitude,
        country_code: field(COL_COUNTRY_CODE).to_string(),
        province_code: field(COL_PROVINCE_CODE).to_string(),
        country_name: field(COL_COUNTRY_NAME).to_string(),
        province_name,
    })
}

fn parse_degrees(raw: &str, what: &str, line: u64) -> Result<f64, RegionTableError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| RegionTableError::MalformedRow {
            line,
            reason: format!("invalid {what} '{raw}'"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<RegionTable, RegionTableError> {
        RegionTable::from_reader(text.as_bytes(), "test")
    }

    #[test]
    fn parses_full_rows() {
        let table = parse(
            "4671654\t30.26715\t-97.74306\tAustin\tUS\tTX\tUnited States\tTexas\n\
             5419384\t39.73915\t-104.9847\tDenver\tUS\tCO\tUnited States\tColorado\n",
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        let austin = &table.regions()[0];
        assert_eq!(austin.name, "Austin");
        assert!((austin.latitude - 30.26715).abs() < 1e-9);
        assert!((austin.longitude - -97.74306).abs() < 1e-9);
        assert_eq!(austin.country_code, "US");
        assert_eq!(austin.province_code, "TX");
        assert_eq!(austin.country_name, "United States");
        assert_eq!(austin.province_name.as_deref(), Some("Texas"));
        assert_eq!(table.regions()[1].name, "Denver");
    }

    #[test]
    fn optional_columns_degrade() {
        let table = parse(
            "1\t48.85\t2.35\tParis\tFR\t11\n\
             2\t51.50\t-0.12\tLondon\tGB\tENG\tUnited Kingdom\n\
             3\t35.68\t139.69\tTokyo\tJP\t40\tJapan\t\n",
        )
        .unwrap();

        let paris = &table.regions()[0];
        assert_eq!(paris.country_name, "");
        assert_eq!(paris.province_name, None);

        let london = &table.regions()[1];
        assert_eq!(london.country_name, "United Kingdom");
        assert_eq!(london.province_name, None);

        let tokyo = &table.regions()[2];
        assert_eq!(tokyo.province_name, None);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let table = parse("\n1\t48.85\t2.35\tParis\tFR\t11\n\n\n2\t51.50\t-0.12\tLondon\tGB\tENG\n")
            .unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn short_row_reports_its_line() {
        let err = parse("1\t48.85\t2.35\tParis\tFR\t11\n2\t51.50\t-0.12\tLondon\n").unwrap_err();
        match err {
            RegionTableError::MalformedRow { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn line_numbers_count_blank_lines() {
        let err = parse("\n\n1\t48.85\t2.35\tParis\tFR\t11\n\n2\t51.5\n").unwrap_err();
        assert!(matches!(err, RegionTableError::MalformedRow { line: 5, .. }));

        let err = parse("1\t48.85\t2.35\tParis\tFR\t11\r\n\r\n2\tx\t1\tLondon\tGB\tENG\r\n")
            .unwrap_err();
        assert!(matches!(err, RegionTableError::MalformedRow { line: 3, .. }));
    }

    #[test]
    fn unparseable_latitude_is_malformed() {
        let err = parse("1\tnorth\t2.35\tParis\tFR\t11\n").unwrap_err();
        assert!(matches!(err, RegionTableError::MalformedRow { line: 1, .. }));
    }

    #[test]
    fn out_of_range_coordinate_is_malformed() {
        let err = parse("1\t95.0\t2.35\tNowhere\tXX\t00\n").unwrap_err();
        assert!(matches!(err, RegionTableError::MalformedRow { line: 1, .. }));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(
            parse(""),
            Err(RegionTableError::EmptyReferenceTable)
        ));
        assert!(matches!(
            parse("\n\n"),
            Err(RegionTableError::EmptyReferenceTable)
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let path = std::env::temp_dir().join("photo_regions_missing_table.tsv");
        let _ = std::fs::remove_file(&path);

        assert!(matches!(
            RegionTable::load(&path),
            Err(RegionTableError::MissingReferenceTable { .. })
        ));
    }

    #[test]
    fn loads_from_disk() {
        let path = std::env::temp_dir().join("photo_regions_table_load.tsv");
        std::fs::write(
            &path,
            "1\t30.27\t-97.74\tAustin\tUS\tTX\tUnited States\tTexas\n",
        )
        .unwrap();

        let table = RegionTable::load(&path).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.country_counts().get("US"), Some(&1));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn bundled_table_loads() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/regions.tsv");
        let table = RegionTable::load(&path).unwrap();

        assert!(table.len() > 20);
        assert_eq!(table.regions()[0].name, "Austin");
        assert!(table.country_counts()["US"] >= 2);
    }
}
