//! Warp: reproject and resample onto the reference's resolution/projection.

use std::path::Path;

use crate::artifact::{self, BandArtifact, Stage};
use crate::error::Result;
use crate::raster::commands::{self, Resampling, WarpArgs};
use crate::raster::RasterDescriptor;

/// Reproject a split band onto the reference's resolution and projection,
/// resampling with Lanczos.
///
/// Warp parameters are derived here, per task, from the two metadata
/// snapshots taken at pipeline start. The band index is recovered from the
/// input artifact's file name and re-applied to the output name; it always
/// matches the identity carried by the artifact itself.
pub fn warp_band(
    split: &BandArtifact,
    input: &RasterDescriptor,
    reference: &RasterDescriptor,
    warped_base: &Path,
) -> Result<BandArtifact> {
    let band = artifact::decode(&split.path)?;
    debug_assert_eq!(band, split.band);

    let out_path = artifact::encode(warped_base, band);
    let args = WarpArgs {
        resampling: Resampling::Lanczos,
        // gdalwarp wants positive target resolutions
        x_res: Some(reference.x_res().abs()),
        y_res: Some(reference.y_res().abs()),
        src_nodata: Some(input.nodata),
        dst_nodata: Some(reference.nodata),
        dst_projection: Some(reference.projection_wkt.clone()),
        ..WarpArgs::default()
    };
    commands::warp(&split.path, &out_path, &args)?;
    tracing::info!("band {} is warped", band);
    Ok(BandArtifact::new(band, Stage::Warped, out_path))
}
