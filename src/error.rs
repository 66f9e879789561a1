//! Error taxonomy for the alignment pipeline.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::artifact::Stage;

#[derive(Debug, Error)]
pub enum AlignError {
    /// A required path (input raster, reference raster, temp dir) is missing.
    /// Reported before any stage runs.
    #[error("unable to find path: {0}")]
    InputNotFound(PathBuf),

    /// A raster could not be opened or parsed for metadata.
    #[error("failed to read raster metadata from {path}: {source}")]
    MetadataRead {
        path: PathBuf,
        #[source]
        source: gdal::errors::GdalError,
    },

    #[error("raster {0} has no bands")]
    EmptyRaster(PathBuf),

    /// One or more per-band tasks failed; the whole batch ran to completion
    /// and every failure is aggregated here.
    #[error("{stage} stage failed for {failed} of {total} band(s): {detail}")]
    Stage {
        stage: Stage,
        failed: usize,
        total: usize,
        detail: String,
    },

    /// The intermediate blob between align and save is missing or unreadable.
    #[error("aligned-band blob {path} is missing or unreadable: {detail}")]
    Blob { path: PathBuf, detail: String },

    /// An external GDAL command exited with a failure status.
    #[error("{tool} failed ({status}): {stderr}")]
    Toolkit {
        tool: &'static str,
        status: ExitStatus,
        stderr: String,
    },

    /// A warped band's footprint does not intersect the reference extent.
    #[error("warped band {band} does not overlap the reference extent")]
    NoOverlap { band: usize },

    /// An artifact file name does not carry a decodable band index.
    #[error("artifact name {0:?} does not start with a band index")]
    ArtifactName(PathBuf),

    #[error("expected bands 1..={expected}, saved set is missing band {missing}")]
    MissingBand { expected: usize, missing: usize },

    #[error("saved set holds {actual} artifact(s) for {expected} band(s)")]
    BandCount { expected: usize, actual: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

pub type Result<T> = std::result::Result<T, AlignError>;
