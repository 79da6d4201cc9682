//! Run the generation pipeline.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use wfgen_artifact_model::reveal::RevealScript;
use wfgen_common::config::RenderConfig;
use wfgen_render_engine::{remove_frames_dir, Pipeline, PipelineOptions, RunReport};
use wfgen_toolchain::runner::ProcessRunner;

use crate::GenerateArgs;

/// Conventional exit status after SIGINT.
const INTERRUPTED_EXIT: u8 = 130;

enum Outcome {
    Finished(RunReport),
    Interrupted(&'static str),
}

pub async fn run(args: GenerateArgs, render: RenderConfig) -> anyhow::Result<ExitCode> {
    let script = match &args.reveal {
        Some(path) => RevealScript::from_json_file(path)
            .with_context(|| format!("failed to load reveal script {}", path.display()))?,
        None => RevealScript::default_workflow(),
    };

    let config = Arc::new(
        render
            .with_output_dir(&args.output)
            .with_tool_timeout(Duration::from_secs(args.timeout)),
    );
    let options = PipelineOptions {
        mode: args.mode(),
        package: !args.no_zip,
    };
    let pipeline = Pipeline::new(
        Arc::new(ProcessRunner::new()),
        config.clone(),
        &args.input,
        options,
    )
    .with_reveal_script(script);

    println!("Generating workflow diagram: {}", args.input.display());
    println!("  Output: {}", config.output_dir.display());
    println!("  Mode: {:?}", options.mode);
    println!();

    // The losing future is dropped when select! returns, which kills any
    // running tool and releases the frames directory.
    let outcome = tokio::select! {
        report = pipeline.run() => Outcome::Finished(report),
        signal = shutdown_signal() => Outcome::Interrupted(signal),
    };

    match outcome {
        Outcome::Finished(report) => {
            print_summary(&report);
            if let Some(path) = &args.report {
                let json = serde_json::to_string_pretty(&report)?;
                std::fs::write(path, json)
                    .with_context(|| format!("failed to write report {}", path.display()))?;
            }
            Ok(ExitCode::from(report.exit_code()))
        }
        Outcome::Interrupted(signal) => {
            tracing::warn!(signal, "Interrupted, cleaning up");
            if let Err(e) = remove_frames_dir(&config) {
                tracing::error!(error = %e, "Failed to remove frames directory");
            }
            Ok(ExitCode::from(INTERRUPTED_EXIT))
        }
    }
}

/// Resolves with the name of the first termination signal received.
async fn shutdown_signal() -> &'static str {
    match wait_for_signal().await {
        Ok(name) => name,
        Err(e) => {
            tracing::warn!(error = %e, "Signal handling unavailable");
            std::future::pending().await
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|()| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|()| "Ctrl+C")
}

fn print_summary(report: &RunReport) {
    println!();
    if report.succeeded() {
        println!("Done in {:.1}s", report.elapsed_secs);
    } else {
        println!(
            "Failed: {}",
            report.fatal.as_deref().unwrap_or("unknown error")
        );
    }

    for artifact in report.artifacts.iter() {
        println!(
            "  [OK] {:<4} {} ({:.1} KB)",
            artifact.kind.label(),
            artifact.path().display(),
            artifact.size_bytes() as f64 / 1024.0
        );
    }
    for failure in &report.failures {
        println!("  [FAILED] {}: {}", failure.stage, failure.error);
    }
    for stage in &report.skipped {
        println!("  [SKIPPED] {stage}");
    }
}
