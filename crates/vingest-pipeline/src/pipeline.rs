//! Video ingestion pipeline.
//!
//! One invocation walks `Received → Validated → Staged → Probed →
//! Transformed → Uploaded → Finalized`, or drops into `Failed` from any
//! state. Each temp file is held as a [`TempAsset`], so every exit path
//! deletes it exactly once:
//!
//! - the rewrite output is guarded before the rewrite starts;
//! - the staged upload is released as soon as the rewrite finishes;
//! - the rewritten file is released right after the upload attempt,
//!   whatever its result;
//! - on any early return the remaining assets are removed on drop.

use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;

use vingest_media::{
    processed_path, random_token, FfmpegFastStart, FfprobeClassifier, MediaProbe,
    MediaTransformer, TempAsset, TempFileManager,
};
use vingest_models::{MediaKind, OrientationClass, UploadRequest, VideoId};
use vingest_storage::{ObjectStore, StorageKey};

use crate::config::PipelineConfig;
use crate::error::{IngestError, IngestResult};
use crate::logging::{IngestStage, UploadLogger};
use crate::metrics::record_upload;
use crate::validation::validate_upload;

/// Result of a successful video ingestion.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub video_id: VideoId,
    pub orientation: OrientationClass,
    pub key: StorageKey,
    /// Durable URL of the stored object; the caller writes it onto the record.
    pub reference: String,
}

/// Orchestrates probe, rewrite and upload for one video at a time.
///
/// Invocations share nothing but the assets directory and the object
/// store, so a single pipeline can serve concurrent uploads.
#[derive(Clone)]
pub struct IngestionPipeline {
    config: PipelineConfig,
    temp: TempFileManager,
    probe: Arc<dyn MediaProbe>,
    transformer: Arc<dyn MediaTransformer>,
    store: Arc<dyn ObjectStore>,
}

impl IngestionPipeline {
    /// Create a pipeline using the ffprobe/ffmpeg binaries named in `config`.
    pub fn new(config: PipelineConfig, store: Arc<dyn ObjectStore>) -> Self {
        let probe = FfprobeClassifier::new(&config.ffprobe_path).with_timeout(config.tool_timeout);
        let transformer =
            FfmpegFastStart::new(&config.ffmpeg_path).with_timeout(config.tool_timeout);
        Self::with_components(config, Arc::new(probe), Arc::new(transformer), store)
    }

    /// Create a pipeline from explicit components.
    pub fn with_components(
        config: PipelineConfig,
        probe: Arc<dyn MediaProbe>,
        transformer: Arc<dyn MediaTransformer>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        let temp = TempFileManager::new(&config.assets_root);
        Self {
            config,
            temp,
            probe,
            transformer,
            store,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Temp-file manager, exposed for create/delete accounting.
    pub fn temp_files(&self) -> &TempFileManager {
        &self.temp
    }

    /// Run one upload through the pipeline.
    ///
    /// Either a durable reference comes back or nothing was stored and no
    /// temp file remains.
    pub async fn ingest(&self, request: UploadRequest) -> IngestResult<IngestOutcome> {
        let logger = UploadLogger::new(&request, MediaKind::Video);
        let started = Instant::now();

        let mut stage = IngestStage::Received;
        let result = self
            .advance(&request, &logger, &mut stage)
            .instrument(logger.create_span())
            .await;

        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok(outcome) => {
                logger.log_stage(IngestStage::Finalized, outcome.key.as_str());
                logger.log_completion(&outcome.reference);
                record_upload(MediaKind::Video, "success", elapsed);
            }
            Err(e) => {
                logger.log_error(stage, &e.to_string());
                record_upload(MediaKind::Video, e.kind(), elapsed);
            }
        }

        result
    }

    async fn advance(
        &self,
        request: &UploadRequest,
        logger: &UploadLogger,
        stage: &mut IngestStage,
    ) -> IngestResult<IngestOutcome> {
        logger.log_start(request.size(), &request.media_type);

        // Nothing has touched the disk yet, so a rejection needs no cleanup.
        let extension = validate_upload(MediaKind::Video, request, self.config.max_video_bytes)?;
        *stage = IngestStage::Validated;

        let staged: TempAsset = self
            .temp
            .stage(&extension, &request.payload)
            .await
            .map_err(IngestError::Staging)?;
        *stage = IngestStage::Staged;
        logger.log_stage(*stage, &staged.path().display().to_string());

        let orientation = self
            .probe
            .classify(staged.path())
            .await
            .map_err(IngestError::Probe)?;
        *stage = IngestStage::Probed;
        logger.log_stage(*stage, orientation.as_str());

        // Guard the output before ffmpeg starts writing it, so a cancelled
        // ingest still removes a partial file.
        let mut processed = self.temp.adopt(processed_path(staged.path()));
        let rewritten = match self.transformer.fast_start_rewrite(staged.path()).await {
            Ok(path) => path,
            Err(e) => {
                processed.release().await;
                staged.release().await;
                return Err(IngestError::Transform(e));
            }
        };
        if rewritten != processed.path() {
            processed.release().await;
            processed = self.temp.adopt(rewritten);
        }
        staged.release().await;
        *stage = IngestStage::Transformed;
        logger.log_stage(*stage, &processed.path().display().to_string());

        let key = StorageKey::for_video(orientation, &random_token(), &extension)?;
        let uploaded = self
            .store
            .upload(processed.path(), &key, &request.media_type)
            .await;
        processed.release().await;
        let reference = uploaded?;
        *stage = IngestStage::Uploaded;
        logger.log_stage(*stage, &reference);

        Ok(IngestOutcome {
            video_id: request.video_id.clone(),
            orientation,
            key,
            reference,
        })
    }
}
