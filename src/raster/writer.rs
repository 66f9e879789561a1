//! Writing arrays back to GeoTIFF.

use gdal::cpl::CslStringList;
use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager};
use ndarray::{Array2, Array3, ArrayView2};
use std::path::{Path, PathBuf};

use crate::artifact;
use crate::error::Result;
use crate::raster::commands::CREATION_OPTIONS;

/// Pixel data accepted by [`write_raster`].
#[derive(Debug, Clone)]
pub enum BandData {
    /// One band, shape `(rows, cols)`.
    Single(Array2<f32>),

    /// A band stack, shape `(bands, rows, cols)`.
    Multi(Array3<f32>),
}

/// Write `data` as one or more Float32 GeoTIFFs and return the written paths.
///
/// A 2-D array becomes a single-band raster. A 3-D stack becomes one
/// multiband raster, or with `split` one single-band raster per slice, each
/// named with the band-index convention applied to `out_path`.
pub fn write_raster(
    data: &BandData,
    geo_transform: &[f64; 6],
    projection_wkt: &str,
    out_path: &Path,
    nodata: f64,
    split: bool,
) -> Result<Vec<PathBuf>> {
    match data {
        BandData::Single(band) => {
            write_single(band.view(), geo_transform, projection_wkt, out_path, nodata)?;
            Ok(vec![out_path.to_path_buf()])
        }
        BandData::Multi(stack) if split => {
            let mut paths = Vec::with_capacity(stack.dim().0);
            for (i, band) in stack.outer_iter().enumerate() {
                let path = artifact::encode(out_path, i + 1);
                write_single(band, geo_transform, projection_wkt, &path, nodata)?;
                paths.push(path);
            }
            Ok(paths)
        }
        BandData::Multi(stack) => {
            let (bands, rows, cols) = stack.dim();
            let mut dataset = create_dataset(out_path, cols, rows, bands)?;
            dataset.set_geo_transform(geo_transform)?;
            dataset.set_projection(projection_wkt)?;
            for (i, band) in stack.outer_iter().enumerate() {
                write_band(&mut dataset, i + 1, band, nodata)?;
            }
            Ok(vec![out_path.to_path_buf()])
        }
    }
}

fn write_single(
    data: ArrayView2<'_, f32>,
    geo_transform: &[f64; 6],
    projection_wkt: &str,
    out_path: &Path,
    nodata: f64,
) -> Result<()> {
    let (rows, cols) = data.dim();
    let mut dataset = create_dataset(out_path, cols, rows, 1)?;
    dataset.set_geo_transform(geo_transform)?;
    dataset.set_projection(projection_wkt)?;
    write_band(&mut dataset, 1, data, nodata)
}

fn create_dataset(path: &Path, cols: usize, rows: usize, bands: usize) -> Result<Dataset> {
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut options = CslStringList::new();
    for opt in CREATION_OPTIONS {
        options.add_string(opt)?;
    }
    Ok(driver.create_with_band_type_with_options::<f32, _>(path, cols, rows, bands, &options)?)
}

fn write_band(
    dataset: &mut Dataset,
    index: usize,
    data: ArrayView2<'_, f32>,
    nodata: f64,
) -> Result<()> {
    let (rows, cols) = data.dim();
    let mut band = dataset.rasterband(index)?;
    let mut buffer = Buffer::new((cols, rows), data.iter().copied().collect());
    band.write((0, 0), (cols, rows), &mut buffer)?;
    band.set_no_data_value(Some(nodata))?;
    Ok(())
}
