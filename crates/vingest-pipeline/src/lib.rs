//! Upload ingestion pipeline.
//!
//! Takes an authorized upload, stages it on local disk, classifies its
//! orientation, rewrites it for progressive playback and stores it under an
//! orientation-namespaced key. Thumbnails take a shorter path through
//! [`ThumbnailPipeline`].

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod thumbnail;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use config::{PipelineConfig, ThumbnailMode};
pub use error::{IngestError, IngestResult};
pub use logging::{IngestStage, UploadLogger};
pub use pipeline::{IngestOutcome, IngestionPipeline};
pub use thumbnail::{data_url, ThumbnailPipeline};
pub use validation::validate_upload;
