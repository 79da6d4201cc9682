//! Intermediate files that must not outlive their stage.
//!
//! Both guards delete their path on drop, so cancellation (a dropped
//! pipeline future) cleans up the same way an early return does.

use std::path::{Path, PathBuf};

use wfgen_common::error::WfgenResult;

/// A directory of intermediates, such as the reveal frames.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    armed: bool,
}

impl ScratchDir {
    /// Create an empty directory at `path`, clearing anything a previous run left.
    pub fn create(path: impl Into<PathBuf>) -> WfgenResult<Self> {
        let path = path.into();
        if path.exists() {
            tracing::debug!(path = %path.display(), "Clearing stale scratch directory");
            std::fs::remove_dir_all(&path)?;
        }
        std::fs::create_dir_all(&path)?;
        Ok(Self { path, armed: true })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the directory now and report the outcome.
    pub fn remove(mut self) -> WfgenResult<()> {
        self.armed = false;
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}

/// A single intermediate file, such as the loop palette.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed intermediate file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove intermediate file")
            }
        }
    }
}
