//! Animated GIF loop.
//!
//! From a frame sequence the loop is encoded in two passes: build a palette
//! tuned to the frames, then map the frames onto it with ordered dithering.
//! Without frames, the static PNG is faded in and out instead.

use std::ffi::OsString;
use std::path::Path;

use wfgen_artifact_model::artifact::{Artifact, ArtifactKind};
use wfgen_artifact_model::frames::FrameSequence;
use wfgen_common::config::RenderConfig;
use wfgen_common::error::{WfgenError, WfgenResult};

use crate::context::{clear_stale_output, StageContext};
use crate::scratch::ScratchFile;

pub const LOOP_STAGE: &str = "GIF encode";

/// Intermediate palette written next to the artifacts during pass one.
pub const PALETTE_FILE: &str = "palette.png";

/// What the loop is encoded from.
#[derive(Debug, Clone, Copy)]
pub enum LoopInput<'a> {
    Sequence(&'a FrameSequence),
    /// Fallback when no sequence exists: a fade over the static raster.
    Static(&'a Artifact),
}

impl<'a> LoopInput<'a> {
    /// Prefer the frame sequence; fall back to the raster.
    pub fn select(
        frames: Option<&'a FrameSequence>,
        raster: Option<&'a Artifact>,
    ) -> WfgenResult<Self> {
        match (frames, raster) {
            (Some(frames), _) => Ok(Self::Sequence(frames)),
            (None, Some(raster)) => Ok(Self::Static(raster)),
            (None, None) => Err(WfgenError::stage(
                LOOP_STAGE,
                "neither a frame sequence nor a static PNG is available",
            )),
        }
    }
}

fn scale_filter(config: &RenderConfig) -> String {
    format!(
        "fps={},scale={}:-1:flags=lanczos",
        config.loop_fps(),
        config.width
    )
}

/// Pass one: derive a palette from the frame differences.
pub fn palette_args(frames: &FrameSequence, config: &RenderConfig, palette: &Path) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-framerate".into(),
        config.reveal_fps.to_string().into(),
        "-i".into(),
        frames.pattern().into_os_string(),
        "-vf".into(),
        format!("{},palettegen=stats_mode=diff", scale_filter(config)).into(),
        palette.as_os_str().to_owned(),
    ]
}

/// Pass two: map the frames onto the palette.
pub fn gif_args(
    frames: &FrameSequence,
    config: &RenderConfig,
    palette: &Path,
    output: &Path,
) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-framerate".into(),
        config.reveal_fps.to_string().into(),
        "-i".into(),
        frames.pattern().into_os_string(),
        "-i".into(),
        palette.as_os_str().to_owned(),
        "-lavfi".into(),
        format!(
            "{}[x];[x][1:v]paletteuse=dither=bayer:bayer_scale=5:diff_mode=rectangle",
            scale_filter(config)
        )
        .into(),
        output.as_os_str().to_owned(),
    ]
}

/// Single pass over the static raster with a fade in and a fade out.
pub fn static_args(raster: &Path, config: &RenderConfig, output: &Path) -> Vec<OsString> {
    let fade = config.static_fade_secs;
    let fade_out_start = config.static_loop_secs.saturating_sub(fade);
    vec![
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-loop".into(),
        "1".into(),
        "-i".into(),
        raster.as_os_str().to_owned(),
        "-t".into(),
        config.static_loop_secs.to_string().into(),
        "-vf".into(),
        format!("fade=t=in:st=0:d={fade},fade=t=out:st={fade_out_start}:d={fade}").into(),
        output.as_os_str().to_owned(),
    ]
}

/// Encode `workflow.gif`.
///
/// The palette file is removed whether or not pass two succeeds.
pub async fn encode_loop(ctx: &StageContext<'_>, input: LoopInput<'_>) -> WfgenResult<Artifact> {
    ctx.require_encoder(LOOP_STAGE)?;
    let output = ctx.config.output_path(ArtifactKind::AnimatedLoop.file_name());
    clear_stale_output(&output).await?;

    match input {
        LoopInput::Sequence(frames) => {
            if !frames.is_materialized() {
                return Err(WfgenError::stage(
                    LOOP_STAGE,
                    format!("frame sequence in {} is incomplete", frames.dir().display()),
                ));
            }
            tracing::info!(frames = frames.len(), "Generating GIF from frames...");

            let palette = ScratchFile::new(ctx.config.output_path(PALETTE_FILE));
            let pass_one = ctx
                .invocation(LOOP_STAGE, &ctx.config.encoder)
                .args(palette_args(frames, ctx.config, palette.path()));
            ctx.runner.run(&pass_one).await?;

            let pass_two = ctx
                .invocation(LOOP_STAGE, &ctx.config.encoder)
                .args(gif_args(frames, ctx.config, palette.path(), &output));
            ctx.runner.run(&pass_two).await?;
        }
        LoopInput::Static(raster) => {
            if !raster.exists() {
                return Err(WfgenError::stage(
                    LOOP_STAGE,
                    format!("static PNG {} is missing", raster.path().display()),
                ));
            }
            tracing::info!(source = %raster.path().display(), "Generating GIF from static PNG...");

            let invocation = ctx
                .invocation(LOOP_STAGE, &ctx.config.encoder)
                .args(static_args(raster.path(), ctx.config, &output));
            ctx.runner.run(&invocation).await?;
        }
    }

    let artifact = Artifact::verify(ArtifactKind::AnimatedLoop, output, LOOP_STAGE)?;
    tracing::info!(path = %artifact.path().display(), "Animated GIF generated");
    Ok(artifact)
}
