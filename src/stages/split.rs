//! Split: extract one band into a standalone raster.

use std::path::Path;

use crate::artifact::{self, BandArtifact, Stage};
use crate::error::Result;
use crate::raster::commands;

/// Extract `band` of `input_raster` into a standalone single-band raster
/// next to `split_base`, LZW-compressed.
pub fn split_band(input_raster: &Path, band: usize, split_base: &Path) -> Result<BandArtifact> {
    let out_path = artifact::encode(split_base, band);
    commands::translate_band(input_raster, band, &out_path)?;
    tracing::info!("band {} is split", band);
    Ok(BandArtifact::new(band, Stage::Split, out_path))
}
