//! The four-stage alignment pipeline.
//!
//! ```text
//! ┌───────┐     ┌───────┐     ┌───────┐     ┌───────┐
//! │ Split │────▶│ Warp  │────▶│ Align │────▶│ Save  │
//! └───────┘     └───────┘     └───────┘     └───────┘
//! ```
//!
//! Each stage fans out over bands with a bounded worker pool and is a hard
//! barrier: the next stage starts only after every task of the current stage
//! has finished. Band identity travels with each [`BandArtifact`] and is also
//! encoded into every artifact's file name.

mod metrics;
mod pool;

pub use metrics::{Metrics, MetricsSnapshot};
pub use pool::run_stage;

use std::sync::Arc;
use std::time::Instant;

use crate::artifact::{BandArtifact, Stage};
use crate::config::PipelineConfig;
use crate::error::{AlignError, Result};
use crate::raster;
use crate::stages;

// Intermediate base names; underscore-free so prefixed names decode cleanly.
const SPLIT_BASE: &str = "split.tif";
const WARPED_BASE: &str = "warped.tif";
const ALIGNED_BASE: &str = "aligned.blob";

/// Everything a finished run reports back.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// Saved artifacts, sorted by band index.
    pub outputs: Vec<BandArtifact>,

    pub metrics: MetricsSnapshot,
}

/// Run the full pipeline described by `config`.
pub async fn run(config: &PipelineConfig) -> Result<PipelineOutcome> {
    preflight(config)?;
    config.validate()?;

    // Metadata snapshots, read once, sequentially.
    let reference = Arc::new(raster::read_descriptor(&config.reference_raster)?);
    let input = Arc::new(raster::read_descriptor(&config.input_raster)?);

    tracing::info!(
        "aligning {} band(s) of {} onto the grid of {} ({}x{} px)",
        input.band_count,
        config.input_raster.display(),
        config.reference_raster.display(),
        reference.width,
        reference.height,
    );

    let metrics = Metrics::new();

    // Split
    let workers = config.pools.split.workers();
    tracing::info!("split: {} band(s) across {} worker(s)", input.band_count, workers);
    let start = Instant::now();
    let input_path = config.input_raster.clone();
    let split_base = config.temp_dir.join(SPLIT_BASE);
    let split = run_stage(
        Stage::Split,
        (1..=input.band_count).collect(),
        workers,
        move |band| stages::split_band(&input_path, band, &split_base),
    )
    .await?;
    metrics.record_stage(Stage::Split, split.len() as u64, start.elapsed());

    // Warp
    let workers = config.pools.warp.workers();
    tracing::info!("warp: {} band(s) across {} worker(s)", split.len(), workers);
    let start = Instant::now();
    let warp_input = input.clone();
    let warp_reference = reference.clone();
    let warped_base = config.temp_dir.join(WARPED_BASE);
    let warped = run_stage(Stage::Warped, split, workers, move |artifact| {
        stages::warp_band(&artifact, &warp_input, &warp_reference, &warped_base)
    })
    .await?;
    metrics.record_stage(Stage::Warped, warped.len() as u64, start.elapsed());

    // Align
    let workers = config.pools.align.workers();
    tracing::info!("align: {} band(s) across {} worker(s)", warped.len(), workers);
    let start = Instant::now();
    let align_reference = reference.clone();
    let blob_base = config.temp_dir.join(ALIGNED_BASE);
    let aligned = run_stage(Stage::Aligned, warped, workers, move |artifact| {
        stages::align_band(&artifact, &align_reference, &blob_base)
    })
    .await?;
    metrics.record_stage(Stage::Aligned, aligned.len() as u64, start.elapsed());

    // Save
    let workers = config.pools.save.workers();
    tracing::info!("save: {} band(s) across {} worker(s)", aligned.len(), workers);
    let start = Instant::now();
    let save_reference = reference.clone();
    let output_template = config.output_template.clone();
    let saved = run_stage(Stage::Saved, aligned, workers, move |artifact| {
        stages::save_band(&artifact, &output_template, &save_reference)
    })
    .await?;
    metrics.record_stage(Stage::Saved, saved.len() as u64, start.elapsed());

    let outputs = into_contiguous(saved, input.band_count)?;
    let snapshot = metrics.snapshot();
    tracing::info!("pipeline complete: {}", snapshot);

    Ok(PipelineOutcome {
        outputs,
        metrics: snapshot,
    })
}

/// Check all required paths before any stage runs.
fn preflight(config: &PipelineConfig) -> Result<()> {
    let required = [
        &config.input_raster,
        &config.reference_raster,
        &config.temp_dir,
    ];
    for path in required {
        if !path.exists() {
            return Err(AlignError::InputNotFound(path.clone()));
        }
    }
    Ok(())
}

/// Verify the saved set covers bands 1..=expected exactly once, sorted.
fn into_contiguous(
    mut artifacts: Vec<BandArtifact>,
    expected: usize,
) -> Result<Vec<BandArtifact>> {
    if artifacts.len() != expected {
        return Err(AlignError::BandCount {
            expected,
            actual: artifacts.len(),
        });
    }
    artifacts.sort_by_key(|artifact| artifact.band);
    for (i, artifact) in artifacts.iter().enumerate() {
        if artifact.band != i + 1 {
            return Err(AlignError::MissingBand {
                expected,
                missing: i + 1,
            });
        }
    }
    Ok(artifacts)
}
