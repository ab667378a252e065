//! External tool command builder and runner.
//!
//! Both ffprobe and ffmpeg go through [`ToolCommand`]. The runner collects
//! stdout and stderr concurrently with waiting on the child, so a chatty
//! tool can never block on a full pipe, and the exit status is inspected
//! only after both streams are drained.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use metrics::histogram;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Histogram of external tool wall time, labelled by tool name.
pub const TOOL_DURATION_METRIC: &str = "vingest_tool_duration_seconds";

/// Captured output of a successful tool run.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Builder for an external tool invocation.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    /// Program name or path
    program: PathBuf,
    /// Arguments in order
    args: Vec<OsString>,
    /// Kill the child after this long
    timeout: Option<Duration>,
}

impl ToolCommand {
    /// Create a new command for `program`.
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            timeout: None,
        }
    }

    /// Add one argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Bound the run time; `None` waits forever.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Short tool name for logs and errors.
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    /// Build the argument list.
    pub fn build_args(&self) -> &[OsString] {
        &self.args
    }

    /// Run to completion and return captured output.
    ///
    /// Fails with [`MediaError::ToolFailed`] on a non-zero exit and
    /// [`MediaError::Timeout`] when the timeout elapses (the child is killed).
    pub async fn run(&self) -> MediaResult<ToolOutput> {
        let tool = self.tool_name();
        which::which(&self.program).map_err(|_| MediaError::ToolNotFound(tool.clone()))?;

        debug!(
            "Running {}: {} {}",
            tool,
            self.program.display(),
            self.args
                .iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let started = Instant::now();
        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Dropping the pending future on timeout drops the child, which kills it.
        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!("{} timed out after {:?}, killing process", tool, limit);
                    return Err(MediaError::Timeout { tool, limit });
                }
            },
            None => child.wait_with_output().await?,
        };

        histogram!(TOOL_DURATION_METRIC, "tool" => tool.clone())
            .record(started.elapsed().as_secs_f64());

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(MediaError::tool_failed(
                tool,
                "exited with non-zero status",
                Some(stderr),
                output.status.code(),
            ));
        }

        Ok(ToolOutput { stdout, stderr })
    }
}
