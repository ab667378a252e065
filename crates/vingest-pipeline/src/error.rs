//! Pipeline error types.

use thiserror::Error;

use vingest_media::MediaError;
use vingest_storage::StorageError;

pub type IngestResult<T> = Result<T, IngestError>;

#[derive(Debug, Error)]
pub enum IngestError {
    /// Bad or missing file, disallowed type, oversize payload.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Caller does not own the target record.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Writing the payload to local disk failed.
    #[error("Staging failed: {0}")]
    Staging(#[source] MediaError),

    #[error("Probe failed: {0}")]
    Probe(#[source] MediaError),

    #[error("Transform failed: {0}")]
    Transform(#[source] MediaError),

    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),
}

impl IngestError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Whether the failure is reported to the client as a bad request.
    ///
    /// External tool and storage failures are not distinguished from
    /// malformed input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            IngestError::Validation(_)
                | IngestError::Probe(_)
                | IngestError::Transform(_)
                | IngestError::Storage(_)
        )
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::Validation(_) => "validation",
            IngestError::Forbidden(_) => "forbidden",
            IngestError::Staging(_) => "staging",
            IngestError::Probe(_) => "probe",
            IngestError::Transform(_) => "transform",
            IngestError::Storage(_) => "storage",
        }
    }
}
