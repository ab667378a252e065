//! Error types for media operations.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while probing, rewriting or staging media.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0} not found in PATH")]
    ToolNotFound(String),

    #[error("{tool} failed: {message}")]
    ToolFailed {
        tool: String,
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("{tool} timed out after {limit:?}")]
    Timeout { tool: String, limit: Duration },

    #[error("Invalid probe output: {0}")]
    InvalidProbeOutput(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create a tool failure error.
    pub fn tool_failed(
        tool: impl Into<String>,
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an invalid probe output error.
    pub fn invalid_probe_output(message: impl Into<String>) -> Self {
        Self::InvalidProbeOutput(message.into())
    }

    /// Whether this is an IO "not found" error (tolerated during cleanup).
    pub fn is_not_found(&self) -> bool {
        matches!(self, MediaError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}
