//! The diagram source consumed by the renderer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use wfgen_common::error::{WfgenError, WfgenResult};

/// Diagram text read once at pipeline start. The content is opaque: it is
/// handed to the renderer by path and never parsed or rewritten.
#[derive(Debug, Clone)]
pub struct DiagramSource {
    path: PathBuf,
    text: Arc<str>,
}

impl DiagramSource {
    /// Read the diagram at `path`.
    pub fn load(path: impl AsRef<Path>) -> WfgenResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(WfgenError::FileNotFound { path });
        }
        let text = std::fs::read_to_string(&path)?;
        if text.trim().is_empty() {
            return Err(WfgenError::invalid_input(format!(
                "diagram source {} is empty",
                path.display()
            )));
        }
        Ok(Self {
            path,
            text: Arc::from(text),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }
}
