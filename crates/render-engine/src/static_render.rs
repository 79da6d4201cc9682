//! Static raster and vector renders.

use std::ffi::OsString;
use std::path::Path;

use wfgen_artifact_model::artifact::{Artifact, ArtifactKind};
use wfgen_artifact_model::reveal::RevealScript;
use wfgen_artifact_model::source::DiagramSource;
use wfgen_common::config::{Background, RenderConfig};
use wfgen_common::error::{WfgenError, WfgenResult};

use crate::context::{clear_stale_output, StageContext};
use crate::svg_animation::inject_animation;

pub const RASTER_STAGE: &str = "PNG render";
pub const VECTOR_STAGE: &str = "SVG render";

/// Renderer arguments for one render of `input` into `output`.
///
/// The output format follows the extension of `output`.
pub fn renderer_args(
    input: &Path,
    output: &Path,
    config: &RenderConfig,
    background: Background,
) -> Vec<OsString> {
    vec![
        "-i".into(),
        input.as_os_str().to_owned(),
        "-o".into(),
        output.as_os_str().to_owned(),
        "-w".into(),
        config.width.to_string().into(),
        "-H".into(),
        config.height.to_string().into(),
        "-b".into(),
        background.as_arg().into(),
        "-t".into(),
        config.theme.clone().into(),
        "-p".into(),
        config.browser_config_path().into_os_string(),
    ]
}

/// Render the whole diagram once into `output`.
pub(crate) async fn render_diagram(
    ctx: &StageContext<'_>,
    source: &DiagramSource,
    output: &Path,
    background: Background,
    stage: &str,
) -> WfgenResult<()> {
    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    clear_stale_output(output).await?;

    let invocation = ctx
        .invocation(stage, &ctx.config.renderer)
        .args(renderer_args(source.path(), output, ctx.config, background));
    ctx.runner.run(&invocation).await?;
    Ok(())
}

/// Render `workflow.png` with the configured background.
pub async fn render_raster(ctx: &StageContext<'_>, source: &DiagramSource) -> WfgenResult<Artifact> {
    tracing::info!("Generating static PNG...");
    let output = ctx.config.output_path(ArtifactKind::Raster.file_name());

    render_diagram(ctx, source, &output, ctx.config.background, RASTER_STAGE).await?;
    let artifact = Artifact::verify(ArtifactKind::Raster, output, RASTER_STAGE)?;

    tracing::info!(path = %artifact.path().display(), "PNG generated");
    Ok(artifact)
}

/// Render `workflow.svg` and embed the CSS reveal animation.
///
/// If the renderer succeeds but the injection fails, the un-animated SVG
/// is left on disk and the stage still fails.
pub async fn render_vector(
    ctx: &StageContext<'_>,
    source: &DiagramSource,
    script: &RevealScript,
) -> WfgenResult<Artifact> {
    tracing::info!("Generating animated SVG...");
    let output = ctx.config.output_path(ArtifactKind::Vector.file_name());

    render_diagram(ctx, source, &output, ctx.config.background, VECTOR_STAGE).await?;
    let artifact = Artifact::verify(ArtifactKind::Vector, output, VECTOR_STAGE)?;

    let svg = tokio::fs::read_to_string(artifact.path())
        .await
        .map_err(|e| WfgenError::stage(VECTOR_STAGE, format!("cannot read rendered SVG: {e}")))?;
    let animated = inject_animation(&svg, script)?;
    tokio::fs::write(artifact.path(), animated)
        .await
        .map_err(|e| WfgenError::stage(VECTOR_STAGE, format!("cannot write animated SVG: {e}")))?;

    tracing::info!(path = %artifact.path().display(), "Animated SVG generated");
    Ok(artifact)
}
