//! FFprobe/FFmpeg CLI wrappers for the upload pipeline.
//!
//! This crate provides:
//! - A subprocess runner that drains output before checking exit status
//! - Orientation classification via ffprobe
//! - Fast-start rewriting via ffmpeg (stream copy, no re-encode)
//! - Temp-file staging with guaranteed cleanup

pub mod command;
pub mod error;
pub mod probe;
pub mod temp;
pub mod token;
pub mod transform;

pub use command::{ToolCommand, ToolOutput};
pub use error::{MediaError, MediaResult};
pub use probe::{parse_dimensions, FfprobeClassifier, MediaProbe};
pub use temp::{TempAsset, TempFileManager, TempStats};
pub use token::random_token;
pub use transform::{processed_path, FfmpegFastStart, MediaTransformer};
