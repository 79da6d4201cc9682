#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use wfgen_common::config::{RenderConfig, ToolCommand};
use wfgen_common::error::{WfgenError, WfgenResult};
use wfgen_render_engine::{Pipeline, PipelineMode, PipelineOptions};
use wfgen_toolchain::runner::{ToolInvocation, ToolOutput, ToolRunner};

pub const RENDERER: &str = "mmdc";
pub const ENCODER: &str = "ffmpeg";

const FAKE_SVG: &str =
    r#"<svg id="workflow" xmlns="http://www.w3.org/2000/svg"><g class="node"><text>P</text></g></svg>"#;

/// How the fake reacts when asked to produce a given output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behavior {
    /// Exit non-zero without writing.
    Fail,
    /// Write the output, then exit non-zero.
    FailAfterWrite,
    /// Exit zero without writing.
    Silent,
    /// Never finish on its own; gives up with a timeout like the real runner.
    Hang,
}

/// Scripted stand-in for the renderer and encoder.
///
/// Writes a small file to whatever output an invocation names: `-o` for the
/// renderer, the last argument for the encoder. Raster content embeds the
/// file name so distinct frames differ on disk.
pub struct FakeToolchain {
    renderer_installed: bool,
    encoder_installed: bool,
    rules: Vec<(String, Behavior)>,
    calls: Mutex<Vec<ToolInvocation>>,
}

impl FakeToolchain {
    pub fn all_tools() -> Self {
        Self {
            renderer_installed: true,
            encoder_installed: true,
            rules: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn without_encoder() -> Self {
        Self {
            encoder_installed: false,
            ..Self::all_tools()
        }
    }

    pub fn without_renderer() -> Self {
        Self {
            renderer_installed: false,
            ..Self::all_tools()
        }
    }

    pub fn failing_on(mut self, file_name: &str) -> Self {
        self.rules.push((file_name.to_string(), Behavior::Fail));
        self
    }

    pub fn failing_after_writing(mut self, file_name: &str) -> Self {
        self.rules
            .push((file_name.to_string(), Behavior::FailAfterWrite));
        self
    }

    pub fn silent_on(mut self, file_name: &str) -> Self {
        self.rules.push((file_name.to_string(), Behavior::Silent));
        self
    }

    pub fn hanging_on(mut self, file_name: &str) -> Self {
        self.rules.push((file_name.to_string(), Behavior::Hang));
        self
    }

    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Every call of the encoder binary, probes included.
    pub fn encoder_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.program == ENCODER)
            .count()
    }

    pub fn calls_for_stage(&self, stage: &str) -> Vec<ToolInvocation> {
        self.calls()
            .into_iter()
            .filter(|c| c.stage == stage)
            .collect()
    }

    fn behavior_for(&self, output: &Path) -> Option<Behavior> {
        let name = output.file_name()?.to_string_lossy().into_owned();
        self.rules
            .iter()
            .find(|(target, _)| *target == name)
            .map(|(_, behavior)| *behavior)
    }
}

fn output_of(invocation: &ToolInvocation) -> Option<PathBuf> {
    invocation
        .value_of("-o")
        .or_else(|| invocation.args.last())
        .map(PathBuf::from)
}

fn write_fake_output(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if name.ends_with(".svg") {
        std::fs::write(path, FAKE_SVG)
    } else {
        std::fs::write(path, format!("fake-media:{name}"))
    }
}

#[async_trait::async_trait]
impl ToolRunner for FakeToolchain {
    async fn run(&self, invocation: &ToolInvocation) -> WfgenResult<ToolOutput> {
        self.calls.lock().unwrap().push(invocation.clone());

        let installed = match invocation.program.as_str() {
            RENDERER => self.renderer_installed,
            ENCODER => self.encoder_installed,
            _ => false,
        };
        if !installed {
            return Err(WfgenError::stage(
                &invocation.stage,
                format!("failed to start {}: not found", invocation.program),
            ));
        }
        if invocation.stage == "probe" {
            return Ok(ToolOutput::default());
        }

        let Some(output) = output_of(invocation) else {
            return Ok(ToolOutput::default());
        };
        match self.behavior_for(&output) {
            Some(Behavior::Fail) => Err(WfgenError::stage(
                &invocation.stage,
                format!("{} exited with exit status: 1", invocation.program),
            )),
            Some(Behavior::FailAfterWrite) => {
                write_fake_output(&output)?;
                Err(WfgenError::stage(
                    &invocation.stage,
                    format!("{} exited with exit status: 1", invocation.program),
                ))
            }
            Some(Behavior::Silent) => Ok(ToolOutput::default()),
            Some(Behavior::Hang) => {
                tokio::time::sleep(invocation.timeout).await;
                Err(WfgenError::ToolTimeout {
                    tool: invocation.program.clone(),
                    secs: invocation.timeout.as_secs(),
                })
            }
            None => {
                write_fake_output(&output)?;
                Ok(ToolOutput::default())
            }
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// A fresh output directory and config wired to the fake tool names.
pub fn test_config(name: &str) -> RenderConfig {
    let dir = std::env::temp_dir().join(format!("wfgen_it_{name}"));
    let _ = std::fs::remove_dir_all(&dir);
    RenderConfig::default()
        .with_output_dir(dir)
        .with_renderer(ToolCommand::new(RENDERER))
        .with_renderer_install(None)
        .with_encoder(ToolCommand::new(ENCODER))
        .with_tool_timeout(Duration::from_secs(5))
}

/// The six-node workflow diagram shared by the tests.
pub fn fixture_source() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("workflow.mmd")
}

pub fn pipeline(
    runner: &Arc<FakeToolchain>,
    config: &RenderConfig,
    mode: PipelineMode,
    package: bool,
) -> Pipeline {
    Pipeline::new(
        runner.clone(),
        Arc::new(config.clone()),
        fixture_source(),
        PipelineOptions { mode, package },
    )
}

/// Sorted entry names of a zip archive.
pub fn archive_entries(path: &Path) -> Vec<String> {
    let file = std::fs::File::open(path).unwrap();
    let archive = zip::ZipArchive::new(file).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

pub fn cleanup(config: &RenderConfig) {
    std::fs::remove_dir_all(&config.output_dir).ok();
}
