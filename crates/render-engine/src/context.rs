//! Shared, read-only inputs for every stage call.

use std::path::Path;

use wfgen_common::config::{RenderConfig, ToolCommand};
use wfgen_common::error::{WfgenError, WfgenResult};
use wfgen_toolchain::capability::CapabilitySet;
use wfgen_toolchain::runner::{ToolInvocation, ToolRunner};

/// Everything a stage may read. Nothing in here is mutated after probing.
#[derive(Clone, Copy)]
pub struct StageContext<'a> {
    pub runner: &'a dyn ToolRunner,
    pub config: &'a RenderConfig,
    pub capabilities: CapabilitySet,
}

impl<'a> StageContext<'a> {
    pub fn new(
        runner: &'a dyn ToolRunner,
        config: &'a RenderConfig,
        capabilities: CapabilitySet,
    ) -> Self {
        Self {
            runner,
            config,
            capabilities,
        }
    }

    /// Start an invocation of `command` bounded by the configured timeout.
    pub fn invocation(&self, stage: &str, command: &ToolCommand) -> ToolInvocation {
        ToolInvocation::new(stage, command, self.config.tool_timeout())
    }

    /// Fail the stage when the encoder was not detected at startup.
    pub fn require_encoder(&self, stage: &str) -> WfgenResult<()> {
        if self.capabilities.has_encoder() {
            Ok(())
        } else {
            Err(WfgenError::stage(
                stage,
                format!("encoder `{}` is not available", self.config.encoder.program),
            ))
        }
    }
}

impl std::fmt::Debug for StageContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageContext")
            .field("runner", &self.runner.name())
            .field("output_dir", &self.config.output_dir)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// Remove a previous run's output so the post-run existence check means
/// something.
pub(crate) async fn clear_stale_output(path: &Path) -> WfgenResult<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed stale output");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
