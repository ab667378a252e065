//! Pipeline metrics.

use metrics::{counter, histogram};
use vingest_models::MediaKind;

/// Metric names as constants for consistency.
pub mod names {
    pub const UPLOADS_TOTAL: &str = "vingest_uploads_total";
    pub const UPLOAD_DURATION_SECONDS: &str = "vingest_upload_duration_seconds";
}

/// Record the outcome of one pipeline invocation.
pub fn record_upload(kind: MediaKind, outcome: &'static str, duration_secs: f64) {
    counter!(names::UPLOADS_TOTAL, "kind" => kind.as_str(), "outcome" => outcome).increment(1);
    histogram!(names::UPLOAD_DURATION_SECONDS, "kind" => kind.as_str()).record(duration_secs);
}
