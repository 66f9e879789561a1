//! Raster band alignment pipeline.
//!
//! Aligns each band of a multi-band source raster onto the spatial grid
//! (projection, resolution, extent, nodata convention) of a reference raster,
//! producing one single-band output raster per input band.
//!
//! # Architecture
//!
//! Four barrier-synchronized stages, each fanned out over bands with a
//! bounded worker pool sized by resource profile:
//!
//! - **Split**: extract each band into a standalone compressed raster
//! - **Warp**: reproject/resample onto the reference's resolution and
//!   projection (Lanczos)
//! - **Align**: snap to the reference's exact grid (mean aggregation) and
//!   serialize the array
//! - **Save**: write each aligned array as a GeoTIFF carrying the reference's
//!   projection and nodata
//!
//! All heavy raster work is delegated to GDAL; the pipeline itself only moves
//! per-band artifacts between stages.
//!
//! # Usage
//!
//! ```no_run
//! use raster_align::{run_pipeline, PipelineConfig};
//!
//! # async fn demo() -> raster_align::Result<()> {
//! let config = PipelineConfig::new("input.tif", "reference.tif", "aligned.tif", "/tmp/work");
//! let outcome = run_pipeline(&config).await?;
//! for artifact in &outcome.outputs {
//!     println!("band {} -> {}", artifact.band, artifact.path.display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod blob;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod raster;
pub mod stages;

pub use artifact::{BandArtifact, Stage};
pub use config::{PipelineConfig, PoolPolicy, StagePools};
pub use error::{AlignError, Result};
pub use pipeline::{Metrics, PipelineOutcome};
pub use raster::RasterDescriptor;

/// Run the full alignment pipeline with the given configuration.
pub async fn run_pipeline(config: &PipelineConfig) -> Result<PipelineOutcome> {
    pipeline::run(config).await
}

/// Build a Tokio runtime for driving the pipeline.
pub fn build_runtime(worker_threads: Option<usize>) -> std::io::Result<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();

    if let Some(threads) = worker_threads {
        builder.worker_threads(threads);
    }

    builder.enable_all();
    builder.build()
}
