//! Output artifacts and the per-run artifact set.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use wfgen_common::error::{WfgenError, WfgenResult};

/// Kind of output produced by a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Raster,
    Vector,
    AnimatedLoop,
    Video,
    Archive,
}

impl ArtifactKind {
    /// Every kind the archive may contain, in entry order.
    pub const PACKAGEABLE: [ArtifactKind; 4] = [
        ArtifactKind::Raster,
        ArtifactKind::Vector,
        ArtifactKind::AnimatedLoop,
        ArtifactKind::Video,
    ];

    /// Canonical file name inside the output directory and the archive.
    pub fn file_name(self) -> &'static str {
        match self {
            ArtifactKind::Raster => "workflow.png",
            ArtifactKind::Vector => "workflow.svg",
            ArtifactKind::AnimatedLoop => "workflow.gif",
            ArtifactKind::Video => "workflow.mp4",
            ArtifactKind::Archive => "workflow-package.zip",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ArtifactKind::Raster => "PNG",
            ArtifactKind::Vector => "SVG",
            ArtifactKind::AnimatedLoop => "GIF",
            ArtifactKind::Video => "MP4",
            ArtifactKind::Archive => "ZIP",
        }
    }
}

/// A verified output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

impl Artifact {
    /// Build an artifact for a file a stage claims to have written.
    ///
    /// Fails unless the file exists and is non-empty.
    pub fn verify(kind: ArtifactKind, path: impl Into<PathBuf>, stage: &str) -> WfgenResult<Self> {
        let path = path.into();
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(Self { kind, path }),
            Ok(_) => Err(WfgenError::stage(
                stage,
                format!("{} is empty", path.display()),
            )),
            Err(_) => Err(WfgenError::stage(
                stage,
                format!("produced no output at {}", path.display()),
            )),
        }
    }

    /// Re-checks the location on disk.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn size_bytes(&self) -> u64 {
        std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    pub fn file_name(&self) -> &'static str {
        self.kind.file_name()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Artifacts produced so far in a run, keyed by kind.
///
/// Each stage only adds its own kind, so no two stages ever write the same
/// entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactSet {
    artifacts: BTreeMap<ArtifactKind, Artifact>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an artifact, returning any earlier artifact of the same kind.
    pub fn insert(&mut self, artifact: Artifact) -> Option<Artifact> {
        self.artifacts.insert(artifact.kind, artifact)
    }

    pub fn get(&self, kind: ArtifactKind) -> Option<&Artifact> {
        self.artifacts.get(&kind)
    }

    pub fn contains(&self, kind: ArtifactKind) -> bool {
        self.artifacts.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn kinds(&self) -> Vec<ArtifactKind> {
        self.artifacts.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.values()
    }

    /// Archive candidates that still exist on disk, in entry order.
    pub fn packageable(&self) -> Vec<&Artifact> {
        ArtifactKind::PACKAGEABLE
            .iter()
            .filter_map(|kind| self.artifacts.get(kind))
            .filter(|artifact| artifact.exists())
            .collect()
    }
}
