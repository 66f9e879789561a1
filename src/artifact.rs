//! Band identity: the per-band artifact record and the file-name convention.
//!
//! Every intermediate and output file carries its 1-based band index as a
//! `N_` prefix on the file name, so identity is recoverable from any path.
//! Between stages, identity additionally travels in-process with the
//! [`BandArtifact`] value, so an unusual base name can never corrupt the
//! pipeline itself.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{AlignError, Result};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Split,
    Warped,
    Aligned,
    Saved,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Split => "split",
            Stage::Warped => "warp",
            Stage::Aligned => "align",
            Stage::Saved => "save",
        };
        f.write_str(name)
    }
}

/// One band's state at one pipeline stage.
///
/// Exactly one artifact of each stage exists per band. Artifacts are created
/// by a stage function, read by at most the next stage, and never mutated in
/// place or deleted by the pipeline.
#[derive(Debug, Clone)]
pub struct BandArtifact {
    /// 1-based band index; this is the artifact's identity.
    pub band: usize,

    pub stage: Stage,

    pub path: PathBuf,

    /// Set by the align stage: the geotransform of the aligned grid.
    pub geo_transform: Option<[f64; 6]>,
}

impl BandArtifact {
    pub fn new(band: usize, stage: Stage, path: PathBuf) -> Self {
        Self {
            band,
            stage,
            path,
            geo_transform: None,
        }
    }
}

/// Prefix `band` and an underscore to the file name of `base`.
pub fn encode(base: &Path, band: usize) -> PathBuf {
    let name = base
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut path = base
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    path.push(format!("{band}_{name}"));
    path
}

/// Recover the band index from a file name produced by [`encode`].
///
/// The text before the first underscore of the file name must parse as an
/// index >= 1; anything else is an error rather than a silently wrong band.
pub fn decode(path: &Path) -> Result<usize> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let prefix = name.split('_').next().unwrap_or_default();
    match prefix.parse::<usize>() {
        Ok(band) if band >= 1 => Ok(band),
        _ => Err(AlignError::ArtifactName(path.to_path_buf())),
    }
}
