//! Generator configuration.
//!
//! All render settings are compiled-in defaults. The only value taken from
//! the environment is the headless browser override, read once when the
//! configuration is built.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable naming the headless browser executable used by the renderer.
pub const BROWSER_PATH_ENV: &str = "PUPPETEER_EXECUTABLE_PATH";

/// Top-level configuration for one generator invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Settings shared read-only by every pipeline stage.
    pub render: RenderConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Immutable render settings passed explicitly into every stage call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Output width in pixels.
    pub width: u32,

    /// Output height in pixels.
    pub height: u32,

    /// Background for the static raster and vector artifacts.
    pub background: Background,

    /// Background for animation frames. Video output cannot carry alpha.
    pub frame_background: Background,

    /// Renderer theme name.
    pub theme: String,

    /// Delay between frames of the animated loop (ms).
    pub frame_delay_ms: u32,

    /// Input rate at which reveal frames are fed to the encoder.
    pub reveal_fps: u32,

    /// Number of copies of the final frame appended as an end pause.
    pub pause_frames: usize,

    /// Duration of the static-image fallback loop (seconds).
    pub static_loop_secs: u32,

    /// Fade in/out length used by the static-image fallback loop (seconds).
    pub static_fade_secs: u32,

    /// Upper bound on any single external tool invocation (seconds).
    pub tool_timeout_secs: u64,

    /// Directory that receives every artifact.
    pub output_dir: PathBuf,

    /// Diagram renderer command.
    pub renderer: ToolCommand,

    /// Command that installs the renderer when it is missing.
    pub renderer_install: Option<ToolCommand>,

    /// Video/image encoder command.
    pub encoder: ToolCommand,

    /// Headless browser override for the renderer.
    pub browser_executable: Option<PathBuf>,
}

/// Background treatment passed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    Transparent,
    White,
}

impl Background {
    /// Value passed on the renderer command line.
    pub fn as_arg(self) -> &'static str {
        match self {
            Background::Transparent => "transparent",
            Background::White => "white",
        }
    }
}

/// An external program plus the arguments that always precede stage arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    pub program: String,
    #[serde(default)]
    pub leading_args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Human-readable form for log lines.
    pub fn display_name(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.leading_args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "wfgen=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 600,
            background: Background::Transparent,
            frame_background: Background::White,
            theme: "neutral".to_string(),
            frame_delay_ms: 100,
            reveal_fps: 2,
            pause_frames: 10,
            static_loop_secs: 3,
            static_fade_secs: 1,
            tool_timeout_secs: 300,
            output_dir: PathBuf::from("output"),
            renderer: ToolCommand::new("npx").with_leading_args(["mmdc"]),
            renderer_install: Some(
                ToolCommand::new("npm").with_leading_args(["install", "@mermaid-js/mermaid-cli"]),
            ),
            encoder: ToolCommand::new("ffmpeg"),
            browser_executable: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl RenderConfig {
    /// Defaults plus the browser override from the environment.
    pub fn from_env() -> Self {
        Self {
            browser_executable: std::env::var_os(BROWSER_PATH_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            ..Self::default()
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_renderer(mut self, renderer: ToolCommand) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_renderer_install(mut self, install: Option<ToolCommand>) -> Self {
        self.renderer_install = install;
        self
    }

    pub fn with_encoder(mut self, encoder: ToolCommand) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    /// Output frame rate of the animated loop, derived from the frame delay.
    pub fn loop_fps(&self) -> u32 {
        (1000 / self.frame_delay_ms.max(1)).max(1)
    }

    /// Path of an output file inside the output directory.
    pub fn output_path(&self, file_name: impl AsRef<Path>) -> PathBuf {
        self.output_dir.join(file_name)
    }

    /// Temporary directory holding reveal frames.
    pub fn frames_dir(&self) -> PathBuf {
        self.output_dir.join("frames")
    }

    /// Browser configuration handed to the renderer.
    pub fn browser_config_path(&self) -> PathBuf {
        self.output_dir.join(".puppeteer-config.json")
    }
}
