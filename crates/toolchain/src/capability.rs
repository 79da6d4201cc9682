//! Capability probing.
//!
//! The renderer is required: when it is missing the prober runs the
//! configured install command once and checks again. The encoder is
//! optional and only decides which later stages are reachable.

use std::time::Duration;

use serde::Serialize;
use wfgen_common::config::{RenderConfig, ToolCommand};
use wfgen_common::error::{WfgenError, WfgenResult};

use crate::runner::{ToolInvocation, ToolRunner};

/// Upper bound for a version check. Installs use the configured tool timeout.
const PROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// Snapshot of which external tools were present at startup.
///
/// Computed once per run; stages consult it and never re-probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapabilitySet {
    pub renderer_available: bool,
    /// `None` when the run had no use for the encoder and never probed it.
    pub encoder_available: Option<bool>,
}

impl CapabilitySet {
    pub fn has_encoder(&self) -> bool {
        self.encoder_available == Some(true)
    }
}

/// A tool the generator may need, for the `check` report.
#[derive(Debug, Clone)]
pub struct Capability {
    pub name: String,
    pub description: String,
    pub available: bool,
    pub required: bool,
    pub fix_instructions: Option<String>,
}

/// Probe the renderer, installing it if needed, then the encoder when the
/// run has a use for it.
///
/// Fails only when the renderer cannot be made available. An encoder that
/// is not wanted is never invoked and is reported as not probed.
pub async fn probe(
    runner: &dyn ToolRunner,
    config: &RenderConfig,
    encoder_wanted: bool,
) -> WfgenResult<CapabilitySet> {
    let mut renderer_available = tool_responds(runner, &config.renderer, "--version").await;

    if renderer_available {
        tracing::info!(renderer = %config.renderer.display_name(), "Diagram renderer available");
    } else {
        let Some(install) = &config.renderer_install else {
            return Err(WfgenError::fatal_setup(format!(
                "diagram renderer `{}` not found and no install command is configured",
                config.renderer.display_name()
            )));
        };

        tracing::warn!(
            renderer = %config.renderer.display_name(),
            install = %install.display_name(),
            "Diagram renderer not found. Installing..."
        );
        let invocation = ToolInvocation::new("renderer install", install, config.tool_timeout());
        if let Err(e) = runner.run(&invocation).await {
            return Err(WfgenError::fatal_setup(format!(
                "failed to install diagram renderer: {e}"
            )));
        }

        renderer_available = tool_responds(runner, &config.renderer, "--version").await;
        if !renderer_available {
            return Err(WfgenError::fatal_setup(format!(
                "diagram renderer `{}` still unavailable after install",
                config.renderer.display_name()
            )));
        }
        tracing::info!("Diagram renderer installed");
    }

    if !encoder_wanted {
        tracing::debug!("Encoder not needed for this run, skipping probe");
        return Ok(CapabilitySet {
            renderer_available,
            encoder_available: None,
        });
    }

    let encoder_available = tool_responds(runner, &config.encoder, "-version").await;
    if encoder_available {
        tracing::info!(encoder = %config.encoder.display_name(), "Encoder available");
    } else {
        tracing::warn!(
            encoder = %config.encoder.display_name(),
            "Encoder not found. Video and loop generation will be skipped"
        );
        tracing::warn!("Install with: apt-get install ffmpeg (Linux) or brew install ffmpeg (macOS)");
    }

    Ok(CapabilitySet {
        renderer_available,
        encoder_available: Some(encoder_available),
    })
}

/// Check both tools without installing anything.
pub async fn detect(runner: &dyn ToolRunner, config: &RenderConfig) -> CapabilitySet {
    CapabilitySet {
        renderer_available: tool_responds(runner, &config.renderer, "--version").await,
        encoder_available: Some(tool_responds(runner, &config.encoder, "-version").await),
    }
}

async fn tool_responds(runner: &dyn ToolRunner, command: &ToolCommand, version_flag: &str) -> bool {
    let invocation = ToolInvocation::new("probe", command, PROBE_TIMEOUT).arg(version_flag);
    match runner.run(&invocation).await {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!(tool = %command.display_name(), error = %e, "Probe failed");
            false
        }
    }
}

/// Build report rows for a capability snapshot.
pub fn capability_report(capabilities: &CapabilitySet, config: &RenderConfig) -> Vec<Capability> {
    let encoder_available = capabilities.has_encoder();
    vec![
        Capability {
            name: "Diagram renderer".to_string(),
            description: format!(
                "`{}` renders PNG, SVG, and animation frames",
                config.renderer.display_name()
            ),
            available: capabilities.renderer_available,
            required: true,
            fix_instructions: if capabilities.renderer_available {
                None
            } else {
                Some(
                    config
                        .renderer_install
                        .as_ref()
                        .map(|install| format!("Run: {}", install.display_name()))
                        .unwrap_or_else(|| "Install the diagram renderer CLI".to_string()),
                )
            },
        },
        Capability {
            name: "Encoder".to_string(),
            description: format!(
                "`{}` encodes MP4 video and GIF loops",
                config.encoder.display_name()
            ),
            available: encoder_available,
            required: false,
            fix_instructions: if encoder_available {
                None
            } else {
                Some(
                    "Install with: apt-get install ffmpeg (Linux) or brew install ffmpeg (macOS)"
                        .to_string(),
                )
            },
        },
    ]
}

/// Print a user-friendly capability report.
pub fn print_capability_report(capabilities: &[Capability]) {
    println!("wfgen Tool Capabilities:");
    println!("{}", "-".repeat(60));

    for cap in capabilities {
        let status = if cap.available {
            "[OK]"
        } else if cap.required {
            "[MISSING - REQUIRED]"
        } else {
            "[MISSING - OPTIONAL]"
        };

        println!("  {} {}: {}", status, cap.name, cap.description);

        if let Some(ref fix) = cap.fix_instructions {
            println!("    Fix: {fix}");
        }
    }
}
