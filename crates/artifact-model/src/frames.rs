//! Frame sequence consumed by the video and loop encoders.

use std::path::{Path, PathBuf};

use wfgen_common::error::{WfgenError, WfgenResult};

/// Encoder input pattern matching [`frame_file_name`].
pub const FRAME_PATTERN: &str = "frame-%03d.png";

/// Highest frame count representable with three-digit indices.
pub const MAX_FRAMES: usize = 1000;

/// File name of the frame at `index`. Zero padding keeps lexical and
/// numeric order identical.
pub fn frame_file_name(index: usize) -> String {
    format!("frame-{index:03}.png")
}

/// Ordered, fully materialized list of raster frames.
///
/// The first `scripted` frames come from the reveal script; the rest are
/// copies of the last scripted frame forming the end pause. Once built the
/// sequence is only read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSequence {
    dir: PathBuf,
    frames: Vec<PathBuf>,
    scripted: usize,
}

impl FrameSequence {
    /// Wrap frames already written to `dir`.
    ///
    /// Frames must be named `frame-000.png` onwards with no gaps.
    pub fn new(dir: impl Into<PathBuf>, frames: Vec<PathBuf>, scripted: usize) -> WfgenResult<Self> {
        let dir = dir.into();
        if frames.is_empty() || scripted == 0 || scripted > frames.len() {
            return Err(WfgenError::sequence(format!(
                "invalid frame sequence: {} frames, {} scripted",
                frames.len(),
                scripted
            )));
        }
        if frames.len() > MAX_FRAMES {
            return Err(WfgenError::sequence(format!(
                "{} frames exceed the {MAX_FRAMES}-frame naming limit",
                frames.len()
            )));
        }
        for (index, frame) in frames.iter().enumerate() {
            if *frame != dir.join(frame_file_name(index)) {
                return Err(WfgenError::sequence(format!(
                    "frame {index} is not contiguous: {}",
                    frame.display()
                )));
            }
        }
        Ok(Self {
            dir,
            frames,
            scripted,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn frames(&self) -> &[PathBuf] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn scripted_len(&self) -> usize {
        self.scripted
    }

    pub fn pause_len(&self) -> usize {
        self.frames.len() - self.scripted
    }

    /// The encoder input pattern for this sequence.
    pub fn pattern(&self) -> PathBuf {
        self.dir.join(FRAME_PATTERN)
    }

    /// Whether every frame is still present on disk.
    pub fn is_materialized(&self) -> bool {
        self.frames.iter().all(|f| f.is_file())
    }
}
