//! Error types shared across wfgen crates.

use std::path::PathBuf;

/// Top-level error type for wfgen operations.
#[derive(Debug, thiserror::Error)]
pub enum WfgenError {
    /// A required tool (the diagram renderer) could not be made available.
    #[error("Setup error: {message}")]
    FatalSetup { message: String },

    /// A stage's tool exited non-zero or its expected output is missing.
    #[error("{stage} failed: {message}")]
    StageProduction { stage: String, message: String },

    /// A frame failed to render; no partial sequence is produced.
    #[error("Frame sequence error: {message}")]
    SequenceBuild { message: String },

    #[error("Packaging error: {message}")]
    Packaging { message: String },

    #[error("{tool} timed out after {secs}s")]
    ToolTimeout { tool: String, secs: u64 },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using WfgenError.
pub type WfgenResult<T> = Result<T, WfgenError>;

impl WfgenError {
    pub fn fatal_setup(msg: impl Into<String>) -> Self {
        Self::FatalSetup {
            message: msg.into(),
        }
    }

    pub fn stage(stage: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::StageProduction {
            stage: stage.into(),
            message: msg.into(),
        }
    }

    pub fn sequence(msg: impl Into<String>) -> Self {
        Self::SequenceBuild {
            message: msg.into(),
        }
    }

    pub fn packaging(msg: impl Into<String>) -> Self {
        Self::Packaging {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    /// Whether this error only invalidates the stage that raised it.
    ///
    /// Optional stages (video, loop) absorb these and let the run continue.
    /// Setup failures never qualify.
    pub fn is_stage_local(&self) -> bool {
        !matches!(self, Self::FatalSetup { .. } | Self::InvalidInput { .. })
    }
}
