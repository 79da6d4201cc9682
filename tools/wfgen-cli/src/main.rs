//! wfgen CLI: turn one workflow diagram into every presentation format.
//!
//! Usage:
//!   wfgen [INPUT] [OPTIONS]    Generate PNG, SVG, GIF, MP4 and a ZIP package
//!   wfgen check                Check external tool availability

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Args, Parser, Subcommand};
use wfgen_common::config::{GeneratorConfig, LoggingConfig, RenderConfig};
use wfgen_common::logging::init_logging;
use wfgen_render_engine::PipelineMode;

mod commands;

#[derive(Parser)]
#[command(
    name = "wfgen",
    about = "Generate animated workflow diagrams for releases and docs",
    version,
    author,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    generate: GenerateArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Check external tool availability
    Check,
}

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("format")
        .args(["png_only", "svg_only", "gif_only"])
        .multiple(false)
))]
struct GenerateArgs {
    /// Diagram source file
    #[arg(default_value = "workflow.mmd")]
    input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Render the static PNG only
    #[arg(long)]
    png_only: bool,

    /// Render the animated SVG only
    #[arg(long)]
    svg_only: bool,

    /// Build frames and encode the GIF loop only
    #[arg(long)]
    gif_only: bool,

    /// Skip the ZIP package
    #[arg(long)]
    no_zip: bool,

    /// JSON reveal script replacing the built-in workflow steps
    #[arg(long)]
    reveal: Option<PathBuf>,

    /// Per-tool timeout (seconds)
    #[arg(long, default_value = "300")]
    timeout: u64,

    /// Write the run report as JSON to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

impl GenerateArgs {
    fn mode(&self) -> PipelineMode {
        if self.png_only {
            PipelineMode::RasterOnly
        } else if self.svg_only {
            PipelineMode::VectorOnly
        } else if self.gif_only {
            PipelineMode::LoopOnly
        } else {
            PipelineMode::Full
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let config = GeneratorConfig {
        render: RenderConfig::from_env(),
        logging: LoggingConfig {
            level: log_level.to_string(),
            json: cli.log_json,
            file: cli.log_file,
        },
    };
    init_logging(&config.logging);

    match cli.command {
        Some(Commands::Check) => commands::check::run(config.render).await,
        None => commands::generate::run(cli.generate, config.render).await,
    }
}
