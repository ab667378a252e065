//! FFmpeg fast-start rewrite.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::command::ToolCommand;
use crate::error::{MediaError, MediaResult};

/// Suffix appended to the input path to name the rewritten file.
pub const PROCESSED_SUFFIX: &str = ".processed";

/// Rewrites a local file into a streaming-friendly layout.
#[async_trait]
pub trait MediaTransformer: Send + Sync {
    /// Produce a new file next to `input` and return its path.
    ///
    /// `input` is never modified. On failure no output file is left behind.
    async fn fast_start_rewrite(&self, input: &Path) -> MediaResult<PathBuf>;
}

/// `<input>.processed`
pub fn processed_path(input: &Path) -> PathBuf {
    let mut name: OsString = input.as_os_str().to_owned();
    name.push(PROCESSED_SUFFIX);
    PathBuf::from(name)
}

/// [`MediaTransformer`] backed by the `ffmpeg` binary.
///
/// Copies streams without re-encoding, moves the `moov` atom to the front
/// and keeps the input's metadata tags.
#[derive(Debug, Clone)]
pub struct FfmpegFastStart {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl Default for FfmpegFastStart {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegFastStart {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    /// Kill ffmpeg if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self, input: &Path, output: &Path) -> ToolCommand {
        ToolCommand::new(&self.program)
            .args(["-y", "-v", "error", "-i"])
            .arg(input)
            .args([
                "-movflags",
                "faststart",
                "-map_metadata",
                "0",
                "-codec",
                "copy",
                "-f",
                "mp4",
            ])
            .arg(output)
            .timeout(self.timeout)
    }
}

#[async_trait]
impl MediaTransformer for FfmpegFastStart {
    async fn fast_start_rewrite(&self, input: &Path) -> MediaResult<PathBuf> {
        if !input.exists() {
            return Err(MediaError::FileNotFound(input.to_path_buf()));
        }

        let output = processed_path(input);
        info!("Processing for fast start: {}", output.display());

        if let Err(e) = self.command(input, &output).run().await {
            // ffmpeg may have created a partial output before failing.
            if tokio::fs::remove_file(&output).await.is_ok() {
                debug!("Removed partial output {}", output.display());
            }
            return Err(e);
        }

        Ok(output)
    }
}
