//! Structured upload logging utilities.
//!
//! Provides consistent, structured logging for pipeline invocations with
//! tracing spans and contextual information.

use std::fmt;

use tracing::{error, info, Span};
use vingest_models::{MediaKind, UploadRequest};

/// Pipeline states, in order. `Failed` is reachable from any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Received,
    Validated,
    Staged,
    Probed,
    Transformed,
    Uploaded,
    Finalized,
}

impl IngestStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestStage::Received => "received",
            IngestStage::Validated => "validated",
            IngestStage::Staged => "staged",
            IngestStage::Probed => "probed",
            IngestStage::Transformed => "transformed",
            IngestStage::Uploaded => "uploaded",
            IngestStage::Finalized => "finalized",
        }
    }
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upload logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct UploadLogger {
    video_id: String,
    user_id: String,
    operation: &'static str,
}

impl UploadLogger {
    /// Create a logger for one pipeline invocation.
    pub fn new(request: &UploadRequest, kind: MediaKind) -> Self {
        Self {
            video_id: request.video_id.to_string(),
            user_id: request.user_id.to_string(),
            operation: kind.as_str(),
        }
    }

    pub fn log_start(&self, size: u64, media_type: &str) {
        info!(
            video_id = %self.video_id,
            user_id = %self.user_id,
            operation = self.operation,
            size,
            "Upload started: {}", media_type
        );
    }

    /// Log a state transition.
    pub fn log_stage(&self, stage: IngestStage, detail: &str) {
        info!(
            video_id = %self.video_id,
            operation = self.operation,
            stage = %stage,
            "Upload {}: {}", stage, detail
        );
    }

    /// Log the transition into `Failed`; `stage` is the last state reached.
    pub fn log_error(&self, stage: IngestStage, message: &str) {
        error!(
            video_id = %self.video_id,
            operation = self.operation,
            stage = %stage,
            "Upload failed after {}: {}", stage, message
        );
    }

    pub fn log_completion(&self, reference: &str) {
        info!(
            video_id = %self.video_id,
            operation = self.operation,
            "Upload completed: {}", reference
        );
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn operation(&self) -> &str {
        self.operation
    }

    /// Create a tracing span for this upload.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "upload",
            video_id = %self.video_id,
            user_id = %self.user_id,
            operation = self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vingest_models::{UserId, VideoId};

    #[test]
    fn test_upload_logger_creation() {
        let video_id = VideoId::new();
        let request = UploadRequest::new(video_id.clone(), UserId::from("u1"), vec![1, 2, 3], "video/mp4");
        let logger = UploadLogger::new(&request, MediaKind::Video);

        assert_eq!(logger.video_id(), video_id.to_string());
        assert_eq!(logger.operation(), "video");
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(IngestStage::Staged.to_string(), "staged");
        assert_eq!(IngestStage::Finalized.as_str(), "finalized");
    }
}
