//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use vingest_models::{MAX_THUMBNAIL_BYTES, MAX_VIDEO_BYTES};

/// How thumbnails are turned into references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThumbnailMode {
    /// Embed as a `data:` URL on the record
    #[default]
    Inline,
    /// Upload to the object store
    Store,
}

impl ThumbnailMode {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "inline" => Some(ThumbnailMode::Inline),
            "store" => Some(ThumbnailMode::Store),
            _ => None,
        }
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory for staged uploads and transformed files
    pub assets_root: PathBuf,
    /// ffprobe binary
    pub ffprobe_path: PathBuf,
    /// ffmpeg binary
    pub ffmpeg_path: PathBuf,
    /// Upper bound on each external tool run (`None` disables the bound)
    pub tool_timeout: Option<Duration>,
    /// Largest accepted video payload
    pub max_video_bytes: u64,
    /// Largest accepted thumbnail payload
    pub max_thumbnail_bytes: u64,
    /// Thumbnail reference mode
    pub thumbnail_mode: ThumbnailMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            assets_root: PathBuf::from("./assets"),
            ffprobe_path: PathBuf::from("ffprobe"),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            tool_timeout: Some(Duration::from_secs(600)), // 10 minutes
            max_video_bytes: MAX_VIDEO_BYTES,
            max_thumbnail_bytes: MAX_THUMBNAIL_BYTES,
            thumbnail_mode: ThumbnailMode::Inline,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            assets_root: std::env::var("ASSETS_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.assets_root),
            ffprobe_path: std::env::var("FFPROBE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffprobe_path),
            ffmpeg_path: std::env::var("FFMPEG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffmpeg_path),
            tool_timeout: match std::env::var("TOOL_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
            {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => defaults.tool_timeout,
            },
            max_video_bytes: defaults.max_video_bytes,
            max_thumbnail_bytes: defaults.max_thumbnail_bytes,
            thumbnail_mode: std::env::var("THUMBNAIL_MODE")
                .ok()
                .and_then(|s| ThumbnailMode::parse(&s))
                .unwrap_or(defaults.thumbnail_mode),
        }
    }

    /// Use `root` for temp files.
    pub fn with_assets_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.assets_root = root.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_video_bytes, 1 << 30);
        assert_eq!(config.max_thumbnail_bytes, 10 << 20);
        assert_eq!(config.thumbnail_mode, ThumbnailMode::Inline);
        assert_eq!(config.tool_timeout, Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_thumbnail_mode_parse() {
        assert_eq!(ThumbnailMode::parse("STORE"), Some(ThumbnailMode::Store));
        assert_eq!(ThumbnailMode::parse(" inline "), Some(ThumbnailMode::Inline));
        assert_eq!(ThumbnailMode::parse("s3"), None);
    }
}
