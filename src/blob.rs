//! The serialized hand-off between the align and save stages.
//!
//! An aligned band is written to disk as a gzip-compressed blob so the save
//! stage can run in a separate worker with no shared memory. The blob is not
//! a raster format and is consumed only by the save stage.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{AlignError, Result};

/// One band's aligned pixel data plus the context the save stage needs.
#[derive(Debug, Serialize, Deserialize)]
pub struct AlignedBand {
    /// 1-based band index.
    pub band: usize,

    /// Warped raster this array was aligned from.
    pub source: PathBuf,

    /// Geotransform of the aligned grid.
    pub geo_transform: [f64; 6],

    rows: usize,
    cols: usize,
    values: Vec<f32>,
}

impl AlignedBand {
    pub fn new(
        band: usize,
        source: PathBuf,
        geo_transform: [f64; 6],
        array: &Array2<f32>,
    ) -> Self {
        let (rows, cols) = array.dim();
        Self {
            band,
            source,
            geo_transform,
            rows,
            cols,
            values: array.iter().copied().collect(),
        }
    }

    /// Rebuild the aligned array.
    pub fn array(&self) -> Result<Array2<f32>> {
        Ok(Array2::from_shape_vec(
            (self.rows, self.cols),
            self.values.clone(),
        )?)
    }
}

/// Serialize `aligned` to a gzip-compressed blob at `path`.
pub fn write_blob(path: &Path, aligned: &AlignedBand) -> Result<()> {
    let file = File::create(path)?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::fast());
    serde_json::to_writer(&mut encoder, aligned).map_err(|e| blob_error(path, e))?;
    let mut inner = encoder.finish()?;
    inner.flush()?;
    Ok(())
}

/// Deserialize a blob written by [`write_blob`].
pub fn read_blob(path: &Path) -> Result<AlignedBand> {
    let file = File::open(path).map_err(|e| blob_error(path, e))?;
    let decoder = GzDecoder::new(BufReader::new(file));
    serde_json::from_reader(decoder).map_err(|e| blob_error(path, e))
}

fn blob_error(path: &Path, err: impl std::fmt::Display) -> AlignError {
    AlignError::Blob {
        path: path.to_path_buf(),
        detail: err.to_string(),
    }
}
