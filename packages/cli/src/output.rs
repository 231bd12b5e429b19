//! Rendering of resolved assignments.

use std::io::Write;

use photo_regions_photo_models::PhotoRecord;
use photo_regions_pipeline::Resolution;
use serde::Serialize;

/// Placeholder for photos that have no region.
const NO_REGION: &str = "-";

/// One output row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Assignment<'a> {
    id: &'a str,
    status: &'a str,
    region: Option<&'a str>,
    province: Option<&'a str>,
    country: Option<&'a str>,
}

impl<'a> From<&'a PhotoRecord> for Assignment<'a> {
    fn from(photo: &'a PhotoRecord) -> Self {
        let region = photo.region();
        Self {
            id: photo.id().as_str(),
            status: photo.status().as_ref(),
            region: region.map(|r| r.name.as_str()),
            province: region.map(|r| r.province_name.as_deref().unwrap_or(&r.province_code)),
            country: region.map(|r| r.country_name.as_str()),
        }
    }
}

/// Writes `id \t region \t province \t country` per photo, `-` for photos
/// without a region.
pub fn write_tsv(out: &mut impl Write, resolution: &Resolution) -> std::io::Result<()> {
    for photo in resolution.photos() {
        let row = Assignment::from(photo);
        match row.region {
            Some(region) => writeln!(
                out,
                "{}\t{region}\t{}\t{}",
                row.id,
                row.province.unwrap_or_default(),
                row.country.unwrap_or_default()
            )?,
            None => writeln!(out, "{}\t{NO_REGION}", row.id)?,
        }
    }
    Ok(())
}

/// Writes every photo as a JSON array.
pub fn write_json(out: &mut impl Write, resolution: &Resolution) -> serde_json::Result<()> {
    let rows: Vec<Assignment<'_>> = resolution.photos().map(Assignment::from).collect();
    serde_json::to_writer_pretty(&mut *out, &rows)?;
    writeln!(out).map_err(serde_json::Error::io)
}
