//! Configuration for the alignment pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::thread;

use crate::error::{AlignError, Result};

/// Configuration for one alignment run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Multi-band raster to align.
    pub input_raster: PathBuf,

    /// Raster whose grid (projection, resolution, extent, nodata) is the target.
    pub reference_raster: PathBuf,

    /// Output path template; band N is written next to it as `N_<file name>`.
    pub output_template: PathBuf,

    /// Directory that receives intermediate artifacts. Cleanup is the
    /// caller's concern.
    pub temp_dir: PathBuf,

    /// Per-stage concurrency ceilings.
    #[serde(default)]
    pub pools: StagePools,
}

impl PipelineConfig {
    pub fn new(
        input_raster: impl Into<PathBuf>,
        reference_raster: impl Into<PathBuf>,
        output_template: impl Into<PathBuf>,
        temp_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input_raster: input_raster.into(),
            reference_raster: reference_raster.into(),
            output_template: output_template.into(),
            temp_dir: temp_dir.into(),
            pools: StagePools::default(),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.output_template.file_name().is_none() {
            return Err(AlignError::Config(
                "output template must name a file".to_string(),
            ));
        }
        self.pools.validate()
    }
}

/// One concurrency policy per stage, keyed by resource profile.
///
/// Split and warp are CPU/IO-bound and scale with the host. Align holds a
/// full-resolution array per worker and save is write-bound, so both use
/// small fixed ceilings independent of machine size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StagePools {
    #[serde(default = "cpu_scaled")]
    pub split: PoolPolicy,

    #[serde(default = "cpu_scaled")]
    pub warp: PoolPolicy,

    #[serde(default = "align_pool")]
    pub align: PoolPolicy,

    #[serde(default = "save_pool")]
    pub save: PoolPolicy,
}

impl Default for StagePools {
    fn default() -> Self {
        Self {
            split: cpu_scaled(),
            warp: cpu_scaled(),
            align: align_pool(),
            save: save_pool(),
        }
    }
}

impl StagePools {
    /// Load a pool policy override file (YAML).
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&contents).map_err(|e| {
            AlignError::Config(format!(
                "invalid pool policy file {}: {e}",
                path.display()
            ))
        })
    }

    fn validate(&self) -> Result<()> {
        let stages = [
            ("split", self.split),
            ("warp", self.warp),
            ("align", self.align),
            ("save", self.save),
        ];
        for (name, policy) in stages {
            if let PoolPolicy::Fixed { workers: 0 } = policy {
                return Err(AlignError::Config(format!(
                    "{name} pool must allow at least one worker"
                )));
            }
        }
        Ok(())
    }
}

/// How a stage's worker ceiling is chosen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PoolPolicy {
    /// Scale with the host, keeping `reserve` cores free.
    CpuScaled { reserve: usize },

    /// Fixed ceiling independent of machine size.
    Fixed { workers: usize },
}

impl PoolPolicy {
    /// Resolve the policy to a concrete worker count on this host.
    pub fn workers(self) -> usize {
        match self {
            PoolPolicy::CpuScaled { reserve } => {
                available_cores().saturating_sub(reserve).max(1)
            }
            PoolPolicy::Fixed { workers } => workers.max(1),
        }
    }
}

fn available_cores() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

// Default value functions for serde
fn cpu_scaled() -> PoolPolicy {
    PoolPolicy::CpuScaled { reserve: 1 }
}
fn align_pool() -> PoolPolicy {
    PoolPolicy::Fixed { workers: 3 }
}
fn save_pool() -> PoolPolicy {
    PoolPolicy::Fixed { workers: 4 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pools() {
        let pools = StagePools::default();
        assert_eq!(pools.split, PoolPolicy::CpuScaled { reserve: 1 });
        assert_eq!(pools.warp, PoolPolicy::CpuScaled { reserve: 1 });
        assert_eq!(pools.align, PoolPolicy::Fixed { workers: 3 });
        assert_eq!(pools.save, PoolPolicy::Fixed { workers: 4 });
    }

    #[test]
    fn test_cpu_scaled_never_zero() {
        // Even with a reserve larger than the machine, at least one worker runs.
        let policy = PoolPolicy::CpuScaled { reserve: 4096 };
        assert_eq!(policy.workers(), 1);
    }

    #[test]
    fn test_fixed_workers() {
        assert_eq!(PoolPolicy::Fixed { workers: 3 }.workers(), 3);
    }

    #[test]
    fn test_validate_rejects_zero_fixed_pool() {
        let mut config = PipelineConfig::new("in.tif", "ref.tif", "out.tif", "/tmp");
        config.pools.align = PoolPolicy::Fixed { workers: 0 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_template() {
        let config = PipelineConfig::new("in.tif", "ref.tif", "..", "/tmp");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pools_from_yaml() {
        let yaml = r#"
split:
  fixed:
    workers: 2
align:
  fixed:
    workers: 1
"#;
        let pools: StagePools = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(pools.split, PoolPolicy::Fixed { workers: 2 });
        assert_eq!(pools.align, PoolPolicy::Fixed { workers: 1 });
        // Unspecified stages keep their defaults.
        assert_eq!(pools.warp, PoolPolicy::CpuScaled { reserve: 1 });
        assert_eq!(pools.save, PoolPolicy::Fixed { workers: 4 });
    }
}
