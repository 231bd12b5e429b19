//! Tab-separated photo listing.
//!
//! One photo per line: `id \t latitude \t longitude`. Photos without a
//! location leave both coordinate columns empty (or omit them). Blank lines
//! are skipped.

use std::io::Read;
use std::path::{Path, PathBuf};

use photo_regions_photo_models::PhotoRecord;
use photo_regions_region_models::Coordinate;

use crate::{PhotoSource, PhotoSourceError, ensure_unique_ids};

/// Photo listing read from a TSV file.
#[derive(Debug, Clone)]
pub struct TsvPhotoSource {
    path: PathBuf,
}

impl TsvPhotoSource {
    /// Creates a source for the listing at `path`. Nothing is read until
    /// [`PhotoSource::photos`] is called.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the listing.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PhotoSource for TsvPhotoSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn photos(&self) -> Result<Vec<PhotoRecord>, PhotoSourceError> {
        let file = std::fs::File::open(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PhotoSourceError::Missing {
                    path: self.path.display().to_string(),
                }
            } else {
                PhotoSourceError::Unreadable {
                    path: self.path.display().to_string(),
                    source: e,
                }
            }
        })?;

        let photos = parse_listing(file, &self.path.display().to_string())?;
        ensure_unique_ids(&photos)?;
        Ok(photos)
    }
}

/// Parses a TSV listing from any reader. `label` names the source in errors.
///
/// # Errors
///
/// Returns [`PhotoSourceError::Unreadable`] on I/O failure and
/// [`PhotoSourceError::MalformedRow`] for rows with an empty id, a single
/// coordinate half, or an invalid coordinate.
pub fn parse_listing(
    mut reader: impl Read,
    label: &str,
) -> Result<Vec<PhotoRecord>, PhotoSourceError> {
    let unreadable = |source: std::io::Error| PhotoSourceError::Unreadable {
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

    let mut photos = Vec::new();
    let mut record = csv::StringRecord::new();

    while csv_reader
        .read_record(&mut record)
        .map_err(|e| unreadable(std::io::Error::from(e)))?
    {
        let byte = record.position().map_or(0, csv::Position::byte);
        photos.push(parse_row(&record, line_at(&text, byte))?);
    }

    log::debug!("Parsed {} photos from {label}", photos.len());

    Ok(photos)
}

/// 1-based line of the record whose read started at `byte`, past any blank
/// lines the reader skipped on the way.
fn line_at(text: &str, byte: u64) -> u64 {
    let start = usize::try_from(byte).map_or(text.len(), |b| b.min(text.len()));
    let skipped = text.as_bytes()[start..]
        .iter()
        .take_while(|&&b| matches!(b, b'\n' | b'\r'))
        .count();
    text.as_bytes()[..start + skipped]
        .iter()
        .filter(|&&b| b == b'\n')
        .count() as u64
        + 1
}

fn parse_row(record: &csv::StringRecord, line: u64) -> Result<PhotoRecord, PhotoSourceError> {
    let malformed = |reason: String| PhotoSourceError::MalformedRow { line, reason };

    let id = record.get(0).map(str::trim).unwrap_or_default();
    if id.is_empty() {
        return Err(malformed("empty photo id".to_string()));
    }

    let lat = record.get(1).map(str::trim).filter(|s| !s.is_empty());
    let lng = record.get(2).map(str::trim).filter(|s| !s.is_empty());

    let coordinate = match (lat, lng) {
        (None, None) => None,
        (Some(lat), Some(lng)) => {
            let lat: f64 = lat
                .parse()
                .map_err(|_| malformed(format!("invalid latitude '{lat}'")))?;
            let lng: f64 = lng
                .parse()
                .map_err(|_| malformed(format!("invalid longitude '{lng}'")))?;
            Some(Coordinate::new(lat, lng).map_err(|e| malformed(e.to_string()))?)
        }
        _ => {
            return Err(malformed(
                "latitude and longitude must both be present or both be empty".to_string(),
            ));
        }
    };

    Ok(PhotoRecord::new(id, coordinate))
}
