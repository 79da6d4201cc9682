//! MP4 encode of the reveal sequence.

use std::ffi::OsString;
use std::path::Path;

use wfgen_artifact_model::artifact::{Artifact, ArtifactKind};
use wfgen_artifact_model::frames::FrameSequence;
use wfgen_common::config::RenderConfig;
use wfgen_common::error::{WfgenError, WfgenResult};

use crate::context::{clear_stale_output, StageContext};

pub const VIDEO_STAGE: &str = "MP4 encode";

/// Encoder arguments: H.264, yuv420p, scaled to the configured size.
pub fn video_args(frames: &FrameSequence, config: &RenderConfig, output: &Path) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-framerate".into(),
        config.reveal_fps.to_string().into(),
        "-i".into(),
        frames.pattern().into_os_string(),
        "-c:v".into(),
        "libx264".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-vf".into(),
        format!("scale={}:{}", config.width, config.height).into(),
        output.as_os_str().to_owned(),
    ]
}

/// Encode `workflow.mp4` from a complete frame sequence.
pub async fn encode_video(ctx: &StageContext<'_>, frames: &FrameSequence) -> WfgenResult<Artifact> {
    ctx.require_encoder(VIDEO_STAGE)?;
    if !frames.is_materialized() {
        return Err(WfgenError::stage(
            VIDEO_STAGE,
            format!("frame sequence in {} is incomplete", frames.dir().display()),
        ));
    }

    tracing::info!(frames = frames.len(), "Generating MP4 video...");
    let output = ctx.config.output_path(ArtifactKind::Video.file_name());
    clear_stale_output(&output).await?;

    let invocation = ctx
        .invocation(VIDEO_STAGE, &ctx.config.encoder)
        .args(video_args(frames, ctx.config, &output));
    ctx.runner.run(&invocation).await?;

    let artifact = Artifact::verify(ArtifactKind::Video, output, VIDEO_STAGE)?;
    tracing::info!(path = %artifact.path().display(), "MP4 video generated");
    Ok(artifact)
}
