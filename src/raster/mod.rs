//! GDAL-backed raster access.
//!
//! Metadata snapshots and array I/O go through the `gdal` crate; band
//! extraction and warping shell out to the GDAL command-line tools (see
//! [`commands`]), which own all resampling and codec logic.

pub mod commands;
pub mod writer;

use gdal::Dataset;
use ndarray::Array2;
use std::path::Path;

use crate::error::{AlignError, Result};

/// Sentinel used when a raster does not declare a nodata value.
pub const DEFAULT_NODATA: f64 = -9999.0;

/// Immutable metadata snapshot of a raster, taken once at pipeline start.
#[derive(Debug, Clone)]
pub struct RasterDescriptor {
    /// Spatial reference system in well-known text.
    pub projection_wkt: String,

    /// Six-coefficient affine pixel-to-world mapping.
    pub geo_transform: [f64; 6],

    /// Declared nodata value, or [`DEFAULT_NODATA`].
    pub nodata: f64,

    pub band_count: usize,

    pub width: usize,

    pub height: usize,
}

impl RasterDescriptor {
    /// Pixel width in georeferenced units.
    pub fn x_res(&self) -> f64 {
        self.geo_transform[1]
    }

    /// Pixel height in georeferenced units (negative for north-up rasters).
    pub fn y_res(&self) -> f64 {
        self.geo_transform[5]
    }

    /// Georeferenced extent as `[min_x, min_y, max_x, max_y]`.
    pub fn bounds(&self) -> [f64; 4] {
        let gt = self.geo_transform;
        let x0 = gt[0];
        let y0 = gt[3];
        let x1 = gt[0] + gt[1] * self.width as f64;
        let y1 = gt[3] + gt[5] * self.height as f64;
        [x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)]
    }
}

/// Read a raster's metadata without touching pixel data.
pub fn read_descriptor(path: &Path) -> Result<RasterDescriptor> {
    let dataset = Dataset::open(path).map_err(|source| AlignError::MetadataRead {
        path: path.to_path_buf(),
        source,
    })?;

    let (width, height) = dataset.raster_size();
    let band_count = dataset.raster_count();
    if band_count == 0 {
        return Err(AlignError::EmptyRaster(path.to_path_buf()));
    }

    let geo_transform = dataset
        .geo_transform()
        .map_err(|source| AlignError::MetadataRead {
            path: path.to_path_buf(),
            source,
        })?;

    let nodata = dataset
        .rasterband(1)
        .ok()
        .and_then(|band| band.no_data_value())
        .unwrap_or(DEFAULT_NODATA);

    Ok(RasterDescriptor {
        projection_wkt: dataset.projection(),
        geo_transform,
        nodata,
        band_count,
        width,
        height,
    })
}

/// Align `moving` onto the reference grid and return the aligned array plus
/// its geotransform.
///
/// The moving raster is warped onto the reference's exact extent and pixel
/// grid, aggregating with the toolkit's mean kernel where cell footprints
/// differ. The grid-snapped raster is transient; it lives in `workdir` only
/// for the duration of this call.
pub fn align_to_grid(
    moving: &Path,
    reference: &RasterDescriptor,
    workdir: &Path,
) -> Result<(Array2<f32>, [f64; 6])> {
    let gridded = tempfile::Builder::new()
        .prefix("gridded-")
        .suffix(".tif")
        .tempfile_in(workdir)?;

    let args = commands::WarpArgs {
        resampling: commands::Resampling::Average,
        dst_nodata: Some(reference.nodata),
        dst_projection: Some(reference.projection_wkt.clone()),
        extent: Some(reference.bounds()),
        size: Some((reference.width, reference.height)),
        ..commands::WarpArgs::default()
    };
    commands::warp(moving, gridded.path(), &args)?;

    read_single_band(gridded.path())
}

/// Read the first band of `path` into an `Array2<f32>` plus its geotransform.
pub fn read_single_band(path: &Path) -> Result<(Array2<f32>, [f64; 6])> {
    let dataset = Dataset::open(path)?;
    let (width, height) = dataset.raster_size();
    let geo_transform = dataset.geo_transform()?;

    let band = dataset.rasterband(1)?;
    let buffer = band.read_as::<f32>((0, 0), (width, height), (width, height), None)?;
    let values: Vec<f32> = buffer.into_iter().collect();
    let array = Array2::from_shape_vec((height, width), values)?;

    Ok((array, geo_transform))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::writer::{write_raster, BandData};
    use ndarray::Array2;
    use tempfile::TempDir;

    const WGS84_WKT: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]]"#;

    #[test]
    fn test_descriptor_bounds_north_up() {
        let descriptor = RasterDescriptor {
            projection_wkt: String::new(),
            geo_transform: [500000.0, 30.0, 0.0, 4100000.0, 0.0, -30.0],
            nodata: DEFAULT_NODATA,
            band_count: 1,
            width: 100,
            height: 200,
        };

        assert_eq!(descriptor.x_res(), 30.0);
        assert_eq!(descriptor.y_res(), -30.0);
        assert_eq!(
            descriptor.bounds(),
            [500000.0, 4100000.0 - 6000.0, 503000.0, 4100000.0]
        );
    }

    #[test]
    fn test_read_descriptor_missing_path() {
        let err = read_descriptor(Path::new("/no/such/raster.tif")).unwrap_err();
        assert!(matches!(err, AlignError::MetadataRead { .. }));
    }

    #[test]
    fn test_descriptor_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fixture.tif");
        let geo_transform = [10.0, 1.0, 0.0, 20.0, 0.0, -1.0];
        let data = Array2::from_elem((4, 5), 7.0f32);

        write_raster(
            &BandData::Single(data),
            &geo_transform,
            WGS84_WKT,
            &path,
            -9999.0,
            false,
        )
        .unwrap();

        let descriptor = read_descriptor(&path).unwrap();
        assert_eq!(descriptor.band_count, 1);
        assert_eq!(descriptor.width, 5);
        assert_eq!(descriptor.height, 4);
        assert_eq!(descriptor.geo_transform, geo_transform);
        assert_eq!(descriptor.nodata, -9999.0);
    }

    #[test]
    fn test_read_single_band_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("band.tif");
        let geo_transform = [0.0, 1.0, 0.0, 3.0, 0.0, -1.0];
        let data =
            Array2::from_shape_vec((2, 3), vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();

        write_raster(
            &BandData::Single(data.clone()),
            &geo_transform,
            WGS84_WKT,
            &path,
            -9999.0,
            false,
        )
        .unwrap();

        let (read, gt) = read_single_band(&path).unwrap();
        assert_eq!(read, data);
        assert_eq!(gt, geo_transform);
    }
}
