//! Run counters and per-stage timing.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::artifact::Stage;

/// Atomic counters for a pipeline run.
#[derive(Debug, Default)]
pub struct Metrics {
    bands_split: AtomicU64,
    bands_warped: AtomicU64,
    bands_aligned: AtomicU64,
    bands_saved: AtomicU64,

    // Per-stage wall time (microseconds)
    split_us: AtomicU64,
    warp_us: AtomicU64,
    align_us: AtomicU64,
    save_us: AtomicU64,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Record a completed stage batch.
    pub fn record_stage(&self, stage: Stage, bands: u64, elapsed: Duration) {
        let (count, micros) = match stage {
            Stage::Split => (&self.bands_split, &self.split_us),
            Stage::Warped => (&self.bands_warped, &self.warp_us),
            Stage::Aligned => (&self.bands_aligned, &self.align_us),
            Stage::Saved => (&self.bands_saved, &self.save_us),
        };
        count.fetch_add(bands, Ordering::Relaxed);
        micros.fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    /// Take a point-in-time view of the counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            bands_split: self.bands_split.load(Ordering::Relaxed),
            bands_warped: self.bands_warped.load(Ordering::Relaxed),
            bands_aligned: self.bands_aligned.load(Ordering::Relaxed),
            bands_saved: self.bands_saved.load(Ordering::Relaxed),
            split_secs: self.split_us.load(Ordering::Relaxed) as f64 / 1e6,
            warp_secs: self.warp_us.load(Ordering::Relaxed) as f64 / 1e6,
            align_secs: self.align_us.load(Ordering::Relaxed) as f64 / 1e6,
            save_secs: self.save_us.load(Ordering::Relaxed) as f64 / 1e6,
        }
    }
}

/// Snapshot of the run counters, suitable for logging or serializing.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub bands_split: u64,
    pub bands_warped: u64,
    pub bands_aligned: u64,
    pub bands_saved: u64,
    pub split_secs: f64,
    pub warp_secs: f64,
    pub align_secs: f64,
    pub save_secs: f64,
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "split {} ({:.1}s), warp {} ({:.1}s), align {} ({:.1}s), save {} ({:.1}s)",
            self.bands_split,
            self.split_secs,
            self.bands_warped,
            self.warp_secs,
            self.bands_aligned,
            self.align_secs,
            self.bands_saved,
            self.save_secs
        )
    }
}
