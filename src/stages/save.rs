//! Save: materialize an aligned band as an output raster.

use std::path::Path;

use crate::artifact::{self, BandArtifact, Stage};
use crate::blob;
use crate::error::Result;
use crate::raster::writer::{write_raster, BandData};
use crate::raster::RasterDescriptor;

/// Deserialize an aligned-band blob and write it as a single-band raster
/// carrying the reference's projection and nodata value, named with the band
/// convention applied to `output_template`.
pub fn save_band(
    aligned: &BandArtifact,
    output_template: &Path,
    reference: &RasterDescriptor,
) -> Result<BandArtifact> {
    let band = blob::read_blob(&aligned.path)?;
    debug_assert_eq!(band.band, aligned.band);

    let out_path = artifact::encode(output_template, aligned.band);
    write_raster(
        &BandData::Single(band.array()?),
        &band.geo_transform,
        &reference.projection_wkt,
        &out_path,
        reference.nodata,
        false,
    )?;
    tracing::info!("band {} is saved", aligned.band);
    Ok(BandArtifact::new(aligned.band, Stage::Saved, out_path))
}
