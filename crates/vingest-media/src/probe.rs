//! FFprobe orientation classification.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use vingest_models::OrientationClass;

use crate::command::ToolCommand;
use crate::error::{MediaError, MediaResult};

static WIDTH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""width"\s*:\s*(\d+)"#).expect("valid width regex"));
static HEIGHT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""height"\s*:\s*(\d+)"#).expect("valid height regex"));

/// Classifies a local media file into an [`OrientationClass`].
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn classify(&self, path: &Path) -> MediaResult<OrientationClass>;
}

/// [`MediaProbe`] backed by the `ffprobe` binary.
#[derive(Debug, Clone)]
pub struct FfprobeClassifier {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl Default for FfprobeClassifier {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl FfprobeClassifier {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    /// Kill ffprobe if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// First video stream only, width and height, JSON output.
    fn command(&self, path: &Path) -> ToolCommand {
        ToolCommand::new(&self.program)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height",
                "-of",
                "json",
            ])
            .arg(path)
            .timeout(self.timeout)
    }
}

#[async_trait]
impl MediaProbe for FfprobeClassifier {
    async fn classify(&self, path: &Path) -> MediaResult<OrientationClass> {
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }

        let output = self.command(path).run().await?;
        debug!("ffprobe stdout: {}", output.stdout.trim());

        let (width, height) = parse_dimensions(&output.stdout)?;
        let class = OrientationClass::from_dimensions(width, height);
        debug!("Classified {} ({}x{}) as {}", path.display(), width, height, class);
        Ok(class)
    }
}

/// Extract `"width": N` and `"height": N` from ffprobe output.
pub fn parse_dimensions(stdout: &str) -> MediaResult<(u32, u32)> {
    let width = capture_u32(&WIDTH_PATTERN, stdout, "width")?;
    let height = capture_u32(&HEIGHT_PATTERN, stdout, "height")?;
    Ok((width, height))
}

fn capture_u32(pattern: &Regex, haystack: &str, field: &str) -> MediaResult<u32> {
    let digits = pattern
        .captures(haystack)
        .and_then(|c| c.get(1))
        .ok_or_else(|| MediaError::invalid_probe_output(format!("missing {} field", field)))?;
    digits
        .as_str()
        .parse()
        .map_err(|_| MediaError::invalid_probe_output(format!("{} out of range", field)))
}
