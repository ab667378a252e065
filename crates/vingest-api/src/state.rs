//! Application state.

use std::sync::Arc;

use anyhow::Context;

use vingest_pipeline::{IngestionPipeline, PipelineConfig, ThumbnailPipeline};
use vingest_storage::{ObjectStore, S3ObjectStore};

use crate::auth::JwtKeys;
use crate::config::ApiConfig;
use crate::store::{MemoryVideoStore, VideoStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub videos: Arc<dyn VideoStore>,
    pub storage: Arc<dyn ObjectStore>,
    pub pipeline: IngestionPipeline,
    pub thumbnails: ThumbnailPipeline,
    pub jwt: Arc<JwtKeys>,
}

impl AppState {
    /// Assemble state from already-built collaborators.
    pub fn new(
        config: ApiConfig,
        videos: Arc<dyn VideoStore>,
        storage: Arc<dyn ObjectStore>,
        pipeline: IngestionPipeline,
        thumbnails: ThumbnailPipeline,
    ) -> Self {
        let jwt = Arc::new(JwtKeys::new(config.jwt_secret.as_bytes()));
        Self {
            config,
            videos,
            storage,
            pipeline,
            thumbnails,
            jwt,
        }
    }

    /// Build state from the environment: S3 storage, local ffprobe/ffmpeg,
    /// in-memory records.
    pub async fn from_env(config: ApiConfig) -> anyhow::Result<Self> {
        let pipeline_config = PipelineConfig::from_env();
        let store: Arc<dyn ObjectStore> = Arc::new(
            S3ObjectStore::from_env()
                .await
                .context("Failed to configure object storage")?,
        );

        let pipeline = IngestionPipeline::new(pipeline_config.clone(), Arc::clone(&store));
        let thumbnails = ThumbnailPipeline::new(pipeline_config, Arc::clone(&store));

        Ok(Self::new(
            config,
            Arc::new(MemoryVideoStore::new()),
            store,
            pipeline,
            thumbnails,
        ))
    }
}
