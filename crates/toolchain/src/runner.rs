//! Typed invocation of external tools.
//!
//! Arguments are always passed as a list, never through a shell, so paths
//! derived from user-supplied diagram names need no quoting.

use std::ffi::OsString;
use std::process::Stdio;
use std::time::Duration;

use wfgen_common::config::ToolCommand;
use wfgen_common::error::{WfgenError, WfgenResult};

/// Longest stderr excerpt carried in an error message.
const STDERR_TAIL_BYTES: usize = 2048;

/// One call of an external program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Pipeline stage that owns the call, used in errors and logs.
    pub stage: String,
    pub program: String,
    pub args: Vec<OsString>,
    pub timeout: Duration,
}

impl ToolInvocation {
    /// Start an invocation of `command`, including its leading arguments.
    pub fn new(stage: impl Into<String>, command: &ToolCommand, timeout: Duration) -> Self {
        Self {
            stage: stage.into(),
            program: command.program.clone(),
            args: command.leading_args.iter().map(OsString::from).collect(),
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The argument following `flag`, if any.
    pub fn value_of(&self, flag: &str) -> Option<&OsString> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|idx| self.args.get(idx + 1))
    }

    /// Lossy single-line rendering for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().map(|a| a.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured output of a successful invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Seam between the pipeline and the operating system.
#[async_trait::async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run the invocation to completion.
    ///
    /// A non-zero exit is an error; so is exceeding `invocation.timeout`.
    async fn run(&self, invocation: &ToolInvocation) -> WfgenResult<ToolOutput>;

    /// Runner name for logs.
    fn name(&self) -> &str;
}

/// Runs tools as child processes on the tokio runtime.
///
/// Children are killed when their future is dropped, which covers both
/// timeouts and cancellation of the whole pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, invocation: &ToolInvocation) -> WfgenResult<ToolOutput> {
        tracing::debug!(
            stage = %invocation.stage,
            command = %invocation.command_line(),
            "Running tool"
        );

        let mut cmd = tokio::process::Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            WfgenError::stage(
                &invocation.stage,
                format!("failed to start {}: {e}", invocation.program),
            )
        })?;

        let started = std::time::Instant::now();
        let output = match tokio::time::timeout(invocation.timeout, child.wait_with_output()).await
        {
            Ok(result) => result.map_err(|e| {
                WfgenError::stage(
                    &invocation.stage,
                    format!("failed to wait on {}: {e}", invocation.program),
                )
            })?,
            Err(_) => {
                tracing::warn!(
                    stage = %invocation.stage,
                    program = %invocation.program,
                    timeout_secs = invocation.timeout.as_secs(),
                    "Tool timed out and was killed"
                );
                return Err(WfgenError::ToolTimeout {
                    tool: invocation.program.clone(),
                    secs: invocation.timeout.as_secs(),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        tracing::debug!(
            stage = %invocation.stage,
            status = %output.status,
            elapsed_ms = started.elapsed().as_millis(),
            "Tool finished"
        );

        if !output.status.success() {
            return Err(WfgenError::stage(
                &invocation.stage,
                format!(
                    "{} exited with {}: {}",
                    invocation.program,
                    output.status,
                    stderr_tail(&stderr)
                ),
            ));
        }

        Ok(ToolOutput { stdout, stderr })
    }

    fn name(&self) -> &str {
        "process"
    }
}

fn stderr_tail(stderr: &str) -> &str {
    let trimmed = stderr.trim();
    if trimmed.len() <= STDERR_TAIL_BYTES {
        return trimmed;
    }
    let mut start = trimmed.len() - STDERR_TAIL_BYTES;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    &trimmed[start..]
}
