//! Thin wrappers over the GDAL command-line toolkit.
//!
//! `gdal_translate` extracts single bands and `gdalwarp` does all
//! reprojection and resampling; each worker drives its own subprocess, so no
//! toolkit state is shared between concurrent tasks.

use std::path::Path;
use std::process::Command;

use crate::error::{AlignError, Result};

/// GeoTIFF creation options applied to every intermediate and output raster.
pub const CREATION_OPTIONS: [&str; 2] = ["COMPRESS=LZW", "NUM_THREADS=ALL_CPUS"];

/// Resampling algorithms understood by `gdalwarp -r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resampling {
    NearestNeighbour,
    Bilinear,
    Cubic,
    #[default]
    Lanczos,
    /// Mean of contributing source cells.
    Average,
}

impl Resampling {
    pub fn as_arg(self) -> &'static str {
        match self {
            Resampling::NearestNeighbour => "near",
            Resampling::Bilinear => "bilinear",
            Resampling::Cubic => "cubic",
            Resampling::Lanczos => "lanczos",
            Resampling::Average => "average",
        }
    }
}

/// Arguments for a single `gdalwarp` invocation.
#[derive(Debug, Clone, Default)]
pub struct WarpArgs {
    pub resampling: Resampling,

    /// Target resolution (`-tr`); gdalwarp expects positive values.
    pub x_res: Option<f64>,
    pub y_res: Option<f64>,

    pub src_nodata: Option<f64>,
    pub dst_nodata: Option<f64>,

    /// Target spatial reference (`-t_srs`), WKT or any form gdalwarp accepts.
    pub dst_projection: Option<String>,

    /// Exact output extent `[min_x, min_y, max_x, max_y]` (`-te`).
    pub extent: Option<[f64; 4]>,

    /// Exact output size in pixels `(width, height)` (`-ts`).
    pub size: Option<(usize, usize)>,
}

/// Extract one 1-based band of `src` into a standalone compressed GeoTIFF.
pub fn translate_band(src: &Path, band: usize, dst: &Path) -> Result<()> {
    let mut cmd = Command::new("gdal_translate");
    cmd.arg("-b").arg(band.to_string());
    for opt in CREATION_OPTIONS {
        cmd.arg("-co").arg(opt);
    }
    cmd.arg(src).arg(dst);
    run("gdal_translate", cmd)
}

/// Reproject/resample `src` into `dst` with the toolkit's warper.
pub fn warp(src: &Path, dst: &Path, args: &WarpArgs) -> Result<()> {
    let mut cmd = Command::new("gdalwarp");
    cmd.arg("-of").arg("GTiff").arg("-overwrite");
    cmd.arg("-r").arg(args.resampling.as_arg());
    if let (Some(x), Some(y)) = (args.x_res, args.y_res) {
        cmd.arg("-tr").arg(x.to_string()).arg(y.to_string());
    }
    if let Some(nodata) = args.src_nodata {
        cmd.arg("-srcnodata").arg(nodata.to_string());
    }
    if let Some(nodata) = args.dst_nodata {
        cmd.arg("-dstnodata").arg(nodata.to_string());
    }
    if let Some(srs) = &args.dst_projection {
        cmd.arg("-t_srs").arg(srs);
    }
    if let Some([min_x, min_y, max_x, max_y]) = args.extent {
        cmd.arg("-te")
            .arg(min_x.to_string())
            .arg(min_y.to_string())
            .arg(max_x.to_string())
            .arg(max_y.to_string());
    }
    if let Some((width, height)) = args.size {
        cmd.arg("-ts").arg(width.to_string()).arg(height.to_string());
    }
    for opt in CREATION_OPTIONS {
        cmd.arg("-co").arg(opt);
    }
    cmd.arg(src).arg(dst);
    run("gdalwarp", cmd)
}

fn run(tool: &'static str, mut cmd: Command) -> Result<()> {
    tracing::debug!("running {:?}", cmd);
    let output = cmd.output()?;
    if !output.status.success() {
        return Err(AlignError::Toolkit {
            tool,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resampling_args() {
        assert_eq!(Resampling::Lanczos.as_arg(), "lanczos");
        assert_eq!(Resampling::Average.as_arg(), "average");
        assert_eq!(Resampling::NearestNeighbour.as_arg(), "near");
    }

    #[test]
    fn test_default_resampling_is_lanczos() {
        assert_eq!(Resampling::default(), Resampling::Lanczos);
        assert_eq!(WarpArgs::default().resampling, Resampling::Lanczos);
    }

    #[test]
    fn test_missing_tool_surfaces_io_error() {
        let cmd = Command::new("gdal_translate_does_not_exist");
        let err = run("gdal_translate", cmd).unwrap_err();
        assert!(matches!(err, AlignError::Io(_)));
    }
}
