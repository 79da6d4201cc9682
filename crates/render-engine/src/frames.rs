//! Reveal frame sequence.
//!
//! One full render per reveal step, then `pause_frames` byte copies of the
//! last render so the loop holds on the finished diagram.

use std::path::Path;

use wfgen_artifact_model::artifact::{Artifact, ArtifactKind};
use wfgen_artifact_model::frames::{frame_file_name, FrameSequence, MAX_FRAMES};
use wfgen_artifact_model::reveal::RevealScript;
use wfgen_artifact_model::source::DiagramSource;
use wfgen_common::config::RenderConfig;
use wfgen_common::error::{WfgenError, WfgenResult};

use crate::context::StageContext;
use crate::static_render::render_diagram;

pub const FRAMES_STAGE: &str = "Frame sequence";

/// Render the reveal script into `dir`.
///
/// `dir` must exist and be empty; the caller owns its lifetime. Any failed
/// frame fails the whole sequence.
pub async fn build_frames(
    ctx: &StageContext<'_>,
    source: &DiagramSource,
    script: &RevealScript,
    dir: &Path,
) -> WfgenResult<FrameSequence> {
    let steps = script.len();
    let total = steps + ctx.config.pause_frames;
    if total > MAX_FRAMES {
        return Err(WfgenError::sequence(format!(
            "{steps} steps plus {} pause frames exceed the {MAX_FRAMES}-frame limit",
            ctx.config.pause_frames
        )));
    }

    tracing::info!(steps, "Generating animation frames...");
    let mut frames = Vec::with_capacity(total);

    for (index, step) in script.steps().iter().enumerate() {
        let path = dir.join(frame_file_name(index));
        // Partial rendering is not supported by the renderer; every step shows
        // the complete diagram.
        tracing::debug!(
            step = index,
            visible_nodes = ?step.nodes,
            "Rendering complete diagram for reveal step"
        );

        let stage = format!("frame {}", index + 1);
        render_diagram(ctx, source, &path, ctx.config.frame_background, &stage)
            .await
            .and_then(|()| Artifact::verify(ArtifactKind::Raster, &path, &stage))
            .map_err(|e| {
                WfgenError::sequence(format!("frame {} of {steps} failed: {e}", index + 1))
            })?;

        frames.push(path);
        tracing::info!("Generated frame {}/{}", index + 1, steps);
    }

    let Some(last) = frames.last().cloned() else {
        return Err(WfgenError::sequence("reveal script produced no frames"));
    };
    for pause in 0..ctx.config.pause_frames {
        let path = dir.join(frame_file_name(steps + pause));
        tokio::fs::copy(&last, &path).await.map_err(|e| {
            WfgenError::sequence(format!("failed to copy pause frame {}: {e}", path.display()))
        })?;
        frames.push(path);
    }

    let sequence = FrameSequence::new(dir, frames, steps)?;
    tracing::info!(
        frames = sequence.len(),
        pause = sequence.pause_len(),
        "Generated animation frames"
    );
    Ok(sequence)
}

/// Delete the frames directory if present. Returns whether anything was removed.
pub fn remove_frames_dir(config: &RenderConfig) -> WfgenResult<bool> {
    let dir = config.frames_dir();
    match std::fs::remove_dir_all(&dir) {
        Ok(()) => {
            tracing::info!(path = %dir.display(), "Cleaned up temporary frames");
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_frames_dir_when_absent() {
        let config = RenderConfig::default()
            .with_output_dir(std::env::temp_dir().join("wfgen_test_frames_absent"));
        assert!(!remove_frames_dir(&config).unwrap());
    }

    #[test]
    fn test_remove_frames_dir_when_present() {
        let config = RenderConfig::default()
            .with_output_dir(std::env::temp_dir().join("wfgen_test_frames_present"));
        std::fs::create_dir_all(config.frames_dir()).unwrap();
        std::fs::write(config.frames_dir().join("frame-000.png"), b"x").unwrap();

        assert!(remove_frames_dir(&config).unwrap());
        assert!(!config.frames_dir().exists());
        std::fs::remove_dir_all(&config.output_dir).ok();
    }
}
