//! Video record persistence.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use vingest_models::{Video, VideoId};

/// Which reference an upload writes onto the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    VideoUrl,
    ThumbnailUrl,
}

/// Storage for video records.
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn insert(&self, video: Video);

    async fn get(&self, id: &VideoId) -> Option<Video>;

    /// Write `reference` into `field` and return the updated record, or
    /// `None` if the record no longer exists.
    async fn set_reference(&self, id: &VideoId, field: RecordField, reference: String)
        -> Option<Video>;
}

/// In-process record store.
#[derive(Debug, Default)]
pub struct MemoryVideoStore {
    videos: RwLock<HashMap<VideoId, Video>>,
}

impl MemoryVideoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoStore for MemoryVideoStore {
    async fn insert(&self, video: Video) {
        self.videos.write().await.insert(video.id.clone(), video);
    }

    async fn get(&self, id: &VideoId) -> Option<Video> {
        self.videos.read().await.get(id).cloned()
    }

    async fn set_reference(
        &self,
        id: &VideoId,
        field: RecordField,
        reference: String,
    ) -> Option<Video> {
        let mut videos = self.videos.write().await;
        let current = videos.remove(id)?;
        let updated = match field {
            RecordField::VideoUrl => current.with_video_url(reference),
            RecordField::ThumbnailUrl => current.with_thumbnail_url(reference),
        };
        videos.insert(id.clone(), updated.clone());
        Some(updated)
    }
}
