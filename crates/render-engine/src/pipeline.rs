//! Pipeline orchestration.
//!
//! Drives one run from the diagram source to the archive, tracking the
//! state machine and recording which optional stages failed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use wfgen_artifact_model::artifact::{Artifact, ArtifactKind, ArtifactSet};
use wfgen_artifact_model::frames::FrameSequence;
use wfgen_artifact_model::reveal::RevealScript;
use wfgen_artifact_model::source::DiagramSource;
use wfgen_common::clock::{RunClock, StageTimer};
use wfgen_common::config::RenderConfig;
use wfgen_common::error::{WfgenError, WfgenResult};
use wfgen_toolchain::browser::write_browser_config;
use wfgen_toolchain::capability::{self, CapabilitySet};
use wfgen_toolchain::runner::ToolRunner;

use crate::context::{clear_stale_output, StageContext};
use crate::frames::{build_frames, remove_frames_dir, FRAMES_STAGE};
use crate::loop_encode::{encode_loop, LoopInput, LOOP_STAGE};
use crate::package::{package, PACKAGE_STAGE};
use crate::scratch::ScratchDir;
use crate::static_render::{render_raster, render_vector, RASTER_STAGE};
use crate::video::{encode_video, VIDEO_STAGE};

/// Which artifacts a run should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineMode {
    /// Raster, vector, video, loop, archive.
    #[default]
    Full,
    RasterOnly,
    VectorOnly,
    /// Frames and loop only. Falls back to a previous run's raster.
    LoopOnly,
}

/// Per-run options chosen on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineOptions {
    pub mode: PipelineMode,
    /// Write the archive. Only meaningful in `Full` mode.
    pub package: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            mode: PipelineMode::Full,
            package: true,
        }
    }
}

/// Orchestrator states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Init,
    Probing,
    Rendering,
    FrameBuilding,
    Encoding,
    Packaging,
    Done,
    Error,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Error)
    }
}

/// An optional stage that failed without ending the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageFailure {
    pub stage: String,
    pub error: String,
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub final_state: PipelineState,
    /// Every state entered, starting with `Init`.
    pub states: Vec<PipelineState>,
    pub artifacts: ArtifactSet,
    pub capabilities: Option<CapabilitySet>,
    pub failures: Vec<StageFailure>,
    /// Stages not attempted because a tool was missing.
    pub skipped: Vec<String>,
    /// The error that moved the run to `Error`.
    pub fatal: Option<String>,
    /// Visible files in the output directory at the end of the run.
    pub output_files: Vec<String>,
    pub started_at: String,
    pub elapsed_secs: f64,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.final_state == PipelineState::Done
    }

    pub fn exit_code(&self) -> u8 {
        if self.succeeded() {
            0
        } else {
            1
        }
    }

    pub fn failed_stage(&self, stage: &str) -> Option<&StageFailure> {
        self.failures.iter().find(|f| f.stage == stage)
    }
}

/// Mutable bookkeeping for a single run.
struct PipelineRun {
    state: PipelineState,
    history: Vec<PipelineState>,
    artifacts: ArtifactSet,
    capabilities: Option<CapabilitySet>,
    failures: Vec<StageFailure>,
    skipped: Vec<String>,
    clock: RunClock,
    stage_timer: StageTimer,
}

impl PipelineRun {
    fn new() -> Self {
        let clock = RunClock::start();
        Self {
            state: PipelineState::Init,
            history: vec![PipelineState::Init],
            artifacts: ArtifactSet::new(),
            capabilities: None,
            failures: Vec::new(),
            skipped: Vec::new(),
            stage_timer: clock.stage(),
            clock,
        }
    }

    fn transition(&mut self, next: PipelineState) {
        tracing::debug!(
            from = ?self.state,
            to = ?next,
            elapsed_ms = self.stage_timer.elapsed_ms() as u64,
            "Pipeline state change"
        );
        self.stage_timer = self.clock.stage();
        self.state = next;
        self.history.push(next);
    }

    fn record(&mut self, artifact: Artifact) {
        self.artifacts.insert(artifact);
    }

    fn record_failure(&mut self, stage: &str, error: &WfgenError) {
        tracing::warn!(stage, error = %error, "Optional stage failed, continuing");
        self.failures.push(StageFailure {
            stage: stage.to_string(),
            error: error.to_string(),
        });
    }

    fn into_report(self, fatal: Option<String>, output_files: Vec<String>) -> RunReport {
        RunReport {
            final_state: self.state,
            states: self.history,
            artifacts: self.artifacts,
            capabilities: self.capabilities,
            failures: self.failures,
            skipped: self.skipped,
            fatal,
            output_files,
            started_at: self.clock.started_at().to_string(),
            elapsed_secs: self.clock.elapsed_secs(),
        }
    }
}

/// One configured pipeline. `run` may be called repeatedly.
pub struct Pipeline {
    runner: Arc<dyn ToolRunner>,
    config: Arc<RenderConfig>,
    source: PathBuf,
    script: RevealScript,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        runner: Arc<dyn ToolRunner>,
        config: Arc<RenderConfig>,
        source: impl Into<PathBuf>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            runner,
            config,
            source: source.into(),
            script: RevealScript::default_workflow(),
            options,
        }
    }

    pub fn with_reveal_script(mut self, script: RevealScript) -> Self {
        self.script = script;
        self
    }

    /// Execute the run to a terminal state.
    ///
    /// Never returns an error: failures are reported through the `Error`
    /// state. Dropping the future removes the frames directory.
    pub async fn run(&self) -> RunReport {
        tracing::info!(
            source = %self.source.display(),
            output = %self.config.output_dir.display(),
            mode = ?self.options.mode,
            "Workflow diagram generator starting"
        );

        let mut run = PipelineRun::new();
        let outcome = self.drive(&mut run).await;

        let fatal = match outcome {
            Ok(()) => {
                run.transition(PipelineState::Done);
                None
            }
            Err(e) => {
                tracing::error!(state = ?run.state, error = %e, "Pipeline failed");
                if let Err(cleanup) = remove_frames_dir(&self.config) {
                    tracing::warn!(error = %cleanup, "Failed to remove frames directory");
                }
                run.transition(PipelineState::Error);
                Some(e.to_string())
            }
        };

        let output_files = visible_output_files(&self.config.output_dir);
        tracing::info!(
            output = %self.config.output_dir.display(),
            files = %output_files.join(", "),
            elapsed_secs = %format!("{:.1}", run.clock.elapsed_secs()),
            "Generated files"
        );
        run.into_report(fatal, output_files)
    }

    async fn drive(&self, run: &mut PipelineRun) -> WfgenResult<()> {
        run.transition(PipelineState::Probing);
        let encoder_wanted = matches!(
            self.options.mode,
            PipelineMode::Full | PipelineMode::LoopOnly
        );
        let capabilities =
            capability::probe(self.runner.as_ref(), &self.config, encoder_wanted).await?;
        run.capabilities = Some(capabilities);

        let source = DiagramSource::load(&self.source)?;
        tracing::debug!(lines = source.line_count(), "Loaded diagram source");
        write_browser_config(&self.config)?;

        let ctx = StageContext::new(self.runner.as_ref(), &self.config, capabilities);

        match self.options.mode {
            PipelineMode::RasterOnly => {
                run.transition(PipelineState::Rendering);
                run.record(render_raster(&ctx, &source).await?);
                self.finish_single_format(run);
                Ok(())
            }
            PipelineMode::VectorOnly => {
                run.transition(PipelineState::Rendering);
                run.record(render_vector(&ctx, &source, &self.script).await?);
                self.finish_single_format(run);
                Ok(())
            }
            PipelineMode::LoopOnly => self.drive_loop_only(run, &ctx, &source).await,
            PipelineMode::Full => self.drive_full(run, &ctx, &source).await,
        }
    }

    fn finish_single_format(&self, run: &mut PipelineRun) {
        run.transition(PipelineState::Packaging);
        tracing::debug!("Single-format run, no archive written");
    }

    async fn drive_full(
        &self,
        run: &mut PipelineRun,
        ctx: &StageContext<'_>,
        source: &DiagramSource,
    ) -> WfgenResult<()> {
        run.transition(PipelineState::Rendering);
        run.record(render_raster(ctx, source).await?);
        run.record(render_vector(ctx, source, &self.script).await?);

        // Encodings left by an earlier run must not show up as this run's.
        for kind in [ArtifactKind::Video, ArtifactKind::AnimatedLoop] {
            clear_stale_output(&self.config.output_path(kind.file_name())).await?;
        }

        if ctx.capabilities.has_encoder() {
            run.transition(PipelineState::FrameBuilding);
            let scratch = ScratchDir::create(self.config.frames_dir())?;
            let frames = self.frames_or_fallback(run, ctx, source, &scratch).await?;

            run.transition(PipelineState::Encoding);
            let raster = run.artifacts.get(ArtifactKind::Raster).cloned();
            self.encode_concurrently(run, ctx, frames.as_ref(), raster.as_ref())
                .await;

            scratch.remove()?;
            tracing::info!("Cleaned up temporary frames");
        } else {
            tracing::warn!("Skipping MP4/GIF generation (encoder not available)");
            run.skipped.push(VIDEO_STAGE.to_string());
            run.skipped.push(LOOP_STAGE.to_string());
        }

        if !self.options.package {
            tracing::info!("Packaging disabled");
            return Ok(());
        }

        run.transition(PipelineState::Packaging);
        match package(&run.artifacts, &self.config).await {
            Ok(archive) => run.record(archive),
            Err(e) => run.record_failure(PACKAGE_STAGE, &e),
        }
        Ok(())
    }

    /// Build frames, recording a stage-local failure instead of propagating it.
    async fn frames_or_fallback(
        &self,
        run: &mut PipelineRun,
        ctx: &StageContext<'_>,
        source: &DiagramSource,
        scratch: &ScratchDir,
    ) -> WfgenResult<Option<FrameSequence>> {
        match build_frames(ctx, source, &self.script, scratch.path()).await {
            Ok(frames) => Ok(Some(frames)),
            Err(e) if e.is_stage_local() => {
                run.record_failure(FRAMES_STAGE, &e);
                tracing::warn!("Falling back to static GIF generation");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Run the video and loop encoders side by side. Neither cancels the other.
    async fn encode_concurrently(
        &self,
        run: &mut PipelineRun,
        ctx: &StageContext<'_>,
        frames: Option<&FrameSequence>,
        raster: Option<&Artifact>,
    ) {
        let video = async {
            match frames {
                Some(frames) => encode_video(ctx, frames).await,
                None => Err(WfgenError::stage(VIDEO_STAGE, "no frame sequence available")),
            }
        };
        let animated_loop = async {
            match LoopInput::select(frames, raster) {
                Ok(input) => encode_loop(ctx, input).await,
                Err(e) => Err(e),
            }
        };

        let (video, animated_loop) = tokio::join!(video, animated_loop);

        match video {
            Ok(artifact) => run.record(artifact),
            Err(e) => run.record_failure(VIDEO_STAGE, &e),
        }
        match animated_loop {
            Ok(artifact) => run.record(artifact),
            Err(e) => run.record_failure(LOOP_STAGE, &e),
        }
    }

    async fn drive_loop_only(
        &self,
        run: &mut PipelineRun,
        ctx: &StageContext<'_>,
        source: &DiagramSource,
    ) -> WfgenResult<()> {
        if !ctx.capabilities.has_encoder() {
            return Err(WfgenError::fatal_setup(format!(
                "encoder `{}` is required for GIF generation",
                self.config.encoder.display_name()
            )));
        }

        // A raster from an earlier run is only a fallback input, not part of
        // this run's artifacts.
        let prior_raster = Artifact::verify(
            ArtifactKind::Raster,
            self.config.output_path(ArtifactKind::Raster.file_name()),
            RASTER_STAGE,
        )
        .ok();

        run.transition(PipelineState::Rendering);
        run.transition(PipelineState::FrameBuilding);
        let scratch = ScratchDir::create(self.config.frames_dir())?;
        let frames = match build_frames(ctx, source, &self.script, scratch.path()).await {
            Ok(frames) => Some(frames),
            Err(e) if prior_raster.is_some() && e.is_stage_local() => {
                run.record_failure(FRAMES_STAGE, &e);
                tracing::warn!("Falling back to static GIF generation");
                None
            }
            Err(e) => return Err(e),
        };

        run.transition(PipelineState::Encoding);
        let input = LoopInput::select(frames.as_ref(), prior_raster.as_ref())?;
        run.record(encode_loop(ctx, input).await?);

        scratch.remove()?;
        tracing::info!("Cleaned up temporary frames");
        Ok(())
    }
}

/// Sorted names of non-hidden entries in `dir`.
pub fn visible_output_files(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| !name.starts_with('.'))
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let mut run = PipelineRun::new();
        run.transition(PipelineState::Done);
        let report = run.into_report(None, Vec::new());
        assert!(report.succeeded());
        assert_eq!(report.exit_code(), 0);

        let mut run = PipelineRun::new();
        run.transition(PipelineState::Error);
        let report = run.into_report(Some("boom".into()), Vec::new());
        assert_eq!(report.exit_code(), 1);
        assert!(report.final_state.is_terminal());
    }

    #[test]
    fn test_history_starts_at_init() {
        let mut run = PipelineRun::new();
        run.transition(PipelineState::Probing);
        assert_eq!(
            run.history,
            [PipelineState::Init, PipelineState::Probing]
        );
    }

    #[test]
    fn test_visible_output_files_hide_dotfiles() {
        let dir = std::env::temp_dir().join("wfgen_test_visible_files");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("workflow.png"), b"x").unwrap();
        std::fs::write(dir.join(".puppeteer-config.json"), b"{}").unwrap();
        std::fs::write(dir.join("workflow.gif"), b"x").unwrap();

        assert_eq!(
            visible_output_files(&dir),
            ["workflow.gif", "workflow.png"]
        );
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_default_options_package_full_run() {
        let options = PipelineOptions::default();
        assert_eq!(options.mode, PipelineMode::Full);
        assert!(options.package);
    }
}
