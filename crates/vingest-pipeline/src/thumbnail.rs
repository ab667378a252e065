//! Thumbnail ingestion.
//!
//! Thumbnails skip probing and rewriting. Depending on
//! [`ThumbnailMode`] they are either embedded in the record as a `data:`
//! URL or uploaded under `thumbnails/`.

use std::sync::Arc;
use std::time::Instant;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::Instrument;

use vingest_media::{random_token, TempFileManager};
use vingest_models::{MediaKind, UploadRequest};
use vingest_storage::{ObjectStore, StorageKey};

use crate::config::{PipelineConfig, ThumbnailMode};
use crate::error::{IngestError, IngestResult};
use crate::logging::{IngestStage, UploadLogger};
use crate::metrics::record_upload;
use crate::validation::validate_upload;

#[derive(Clone)]
pub struct ThumbnailPipeline {
    config: PipelineConfig,
    temp: TempFileManager,
    store: Arc<dyn ObjectStore>,
}

impl ThumbnailPipeline {
    pub fn new(config: PipelineConfig, store: Arc<dyn ObjectStore>) -> Self {
        let temp = TempFileManager::new(&config.assets_root);
        Self { config, temp, store }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn mode(&self) -> ThumbnailMode {
        self.config.thumbnail_mode
    }

    pub fn temp_files(&self) -> &TempFileManager {
        &self.temp
    }

    /// Validate a thumbnail and turn it into a reference for the record.
    pub async fn ingest(&self, request: UploadRequest) -> IngestResult<String> {
        let logger = UploadLogger::new(&request, MediaKind::Thumbnail);
        let started = Instant::now();

        let mut stage = IngestStage::Received;
        let result = self
            .advance(&request, &logger, &mut stage)
            .instrument(logger.create_span())
            .await;

        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok(reference) => {
                logger.log_stage(IngestStage::Finalized, self.mode_label());
                // Inline references can be megabytes long; log the size only.
                logger.log_completion(&format!("{} chars", reference.len()));
                record_upload(MediaKind::Thumbnail, "success", elapsed);
            }
            Err(e) => {
                logger.log_error(stage, &e.to_string());
                record_upload(MediaKind::Thumbnail, e.kind(), elapsed);
            }
        }
        result
    }

    async fn advance(
        &self,
        request: &UploadRequest,
        logger: &UploadLogger,
        stage: &mut IngestStage,
    ) -> IngestResult<String> {
        logger.log_start(request.size(), &request.media_type);

        let extension =
            validate_upload(MediaKind::Thumbnail, request, self.config.max_thumbnail_bytes)?;
        *stage = IngestStage::Validated;

        match self.config.thumbnail_mode {
            ThumbnailMode::Inline => Ok(data_url(&request.media_type, &request.payload)),
            ThumbnailMode::Store => {
                let staged = self
                    .temp
                    .stage(&extension, &request.payload)
                    .await
                    .map_err(IngestError::Staging)?;
                *stage = IngestStage::Staged;

                let key = StorageKey::for_thumbnail(&random_token(), &extension)?;
                let uploaded = self
                    .store
                    .upload(staged.path(), &key, &request.media_type)
                    .await;
                staged.release().await;
                let reference = uploaded?;
                *stage = IngestStage::Uploaded;
                logger.log_stage(*stage, &reference);
                Ok(reference)
            }
        }
    }

    fn mode_label(&self) -> &'static str {
        match self.config.thumbnail_mode {
            ThumbnailMode::Inline => "inline",
            ThumbnailMode::Store => "stored",
        }
    }
}

/// `data:<media type>;base64,<payload>`
pub fn data_url(media_type: &str, payload: &[u8]) -> String {
    format!("data:{};base64,{}", media_type, STANDARD.encode(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{assets_entries, RecordingStore, TEST_BUCKET_URL};
    use tempfile::TempDir;
    use vingest_models::{UserId, VideoId};

    fn pipeline(dir: &TempDir, mode: ThumbnailMode, store: Arc<RecordingStore>) -> ThumbnailPipeline {
        let config = PipelineConfig {
            thumbnail_mode: mode,
            ..PipelineConfig::default().with_assets_root(dir.path().join("assets"))
        };
        ThumbnailPipeline::new(config, store)
    }

    fn thumbnail(payload: &[u8], media_type: &str) -> UploadRequest {
        UploadRequest::new(VideoId::new(), UserId::from("user-1"), payload.to_vec(), media_type)
    }

    #[test]
    fn test_data_url() {
        assert_eq!(data_url("image/png", b"hi"), "data:image/png;base64,aGk=");
    }

    #[tokio::test]
    async fn test_inline_mode_embeds_payload() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RecordingStore::working());
        let pipeline = pipeline(&dir, ThumbnailMode::Inline, store.clone());

        let reference = pipeline.ingest(thumbnail(b"\x89PNG", "image/png")).await.unwrap();

        assert_eq!(reference, "data:image/png;base64,iVBORw==");
        assert!(store.uploads().is_empty());
        assert_eq!(pipeline.temp_files().stats().created, 0);
    }

    #[tokio::test]
    async fn test_store_mode_uploads_under_thumbnails() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RecordingStore::working());
        let pipeline = pipeline(&dir, ThumbnailMode::Store, store.clone());

        let reference = pipeline.ingest(thumbnail(b"jpegdata", "image/jpeg")).await.unwrap();

        let uploads = store.uploads();
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].key.starts_with("thumbnails/"));
        assert!(uploads[0].key.ends_with(".jpeg"));
        assert_eq!(uploads[0].content_type, "image/jpeg");
        assert_eq!(reference, format!("{}/{}", TEST_BUCKET_URL, uploads[0].key));
        assert_eq!(assets_entries(&dir.path().join("assets")), 0);
    }

    #[tokio::test]
    async fn test_store_failure_cleans_staged_file() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RecordingStore::failing());
        let pipeline = pipeline(&dir, ThumbnailMode::Store, store.clone());

        let err = pipeline.ingest(thumbnail(b"jpegdata", "image/jpeg")).await.unwrap_err();

        assert!(matches!(err, IngestError::Storage(_)));
        assert_eq!(pipeline.temp_files().stats().outstanding(), 0);
        assert_eq!(assets_entries(&dir.path().join("assets")), 0);
    }

    #[tokio::test]
    async fn test_rejects_gif_and_empty() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, ThumbnailMode::Inline, Arc::new(RecordingStore::working()));

        let err = pipeline.ingest(thumbnail(b"GIF89a", "image/gif")).await.unwrap_err();
        assert!(matches!(err, IngestError::Validation(_)));

        let err = pipeline.ingest(thumbnail(b"", "image/png")).await.unwrap_err();
        assert!(err.to_string().contains("thumbnail file missing"));
    }

    #[tokio::test]
    async fn test_rejects_oversized_thumbnail() {
        let dir = TempDir::new().unwrap();
        let config = PipelineConfig {
            max_thumbnail_bytes: 4,
            ..PipelineConfig::default().with_assets_root(dir.path())
        };
        let pipeline = ThumbnailPipeline::new(config, Arc::new(RecordingStore::working()));

        assert!(pipeline.ingest(thumbnail(b"1234", "image/png")).await.is_ok());
        let err = pipeline.ingest(thumbnail(b"12345", "image/png")).await.unwrap_err();
        assert!(matches!(err, IngestError::Validation(_)));
    }
}
