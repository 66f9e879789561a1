//! Align: snap a warped band onto the reference raster's exact grid.

use std::path::Path;

use crate::artifact::{self, BandArtifact, Stage};
use crate::blob::{self, AlignedBand};
use crate::error::{AlignError, Result};
use crate::raster::{self, RasterDescriptor};

/// Compute a pixel-exact alignment of a warped band onto the reference grid
/// and serialize the aligned array for the save stage.
///
/// Cells whose footprint differs from the reference grid are aggregated with
/// the toolkit's mean kernel. A warped band whose footprint does not
/// intersect the reference extent is a fatal error.
pub fn align_band(
    warped: &BandArtifact,
    reference: &RasterDescriptor,
    blob_base: &Path,
) -> Result<BandArtifact> {
    let warped_desc = raster::read_descriptor(&warped.path)?;
    if !bounds_overlap(&warped_desc.bounds(), &reference.bounds()) {
        return Err(AlignError::NoOverlap { band: warped.band });
    }

    let workdir = blob_base.parent().unwrap_or_else(|| Path::new("."));
    let (array, geo_transform) = raster::align_to_grid(&warped.path, reference, workdir)?;

    let out_path = artifact::encode(blob_base, warped.band);
    let aligned = AlignedBand::new(warped.band, warped.path.clone(), geo_transform, &array);
    blob::write_blob(&out_path, &aligned)?;
    tracing::info!("band {} is aligned", warped.band);

    let mut result = BandArtifact::new(warped.band, Stage::Aligned, out_path);
    result.geo_transform = Some(geo_transform);
    Ok(result)
}

fn bounds_overlap(a: &[f64; 4], b: &[f64; 4]) -> bool {
    a[0] < b[2] && b[0] < a[2] && a[1] < b[3] && b[1] < a[3]
}
