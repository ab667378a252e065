//! In-process fakes for the pipeline's external seams.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use vingest_media::{processed_path, MediaError, MediaProbe, MediaResult, MediaTransformer};
use vingest_models::OrientationClass;
use vingest_storage::{ObjectStore, StorageError, StorageKey, StorageResult};

pub const TEST_BUCKET_URL: &str = "https://test-bucket.example.com";

/// Number of entries left under an assets directory (0 if it was never created).
pub fn assets_entries(root: &Path) -> usize {
    match std::fs::read_dir(root) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

pub struct FakeProbe {
    result: Option<OrientationClass>,
    paths: Mutex<Vec<PathBuf>>,
}

impl FakeProbe {
    pub fn returning(orientation: OrientationClass) -> Self {
        Self {
            result: Some(orientation),
            paths: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: None,
            paths: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.paths.lock().unwrap().len()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.lock().unwrap().clone()
    }

    pub fn last_path(&self) -> Option<PathBuf> {
        self.paths.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl MediaProbe for FakeProbe {
    async fn classify(&self, path: &Path) -> MediaResult<OrientationClass> {
        assert!(path.exists(), "probe called on missing file {}", path.display());
        self.paths.lock().unwrap().push(path.to_path_buf());
        self.result.ok_or_else(|| {
            MediaError::tool_failed("ffprobe", "invalid data found", Some("moov atom not found".into()), Some(1))
        })
    }
}

#[derive(Clone, Copy)]
enum Rewrite {
    Copy,
    Fail,
    Hang,
}

pub struct FakeTransformer {
    mode: Rewrite,
}

impl FakeTransformer {
    pub fn working() -> Self {
        Self { mode: Rewrite::Copy }
    }

    pub fn failing() -> Self {
        Self { mode: Rewrite::Fail }
    }

    /// Writes part of the output, then never finishes.
    pub fn hanging() -> Self {
        Self { mode: Rewrite::Hang }
    }
}

#[async_trait]
impl MediaTransformer for FakeTransformer {
    async fn fast_start_rewrite(&self, input: &Path) -> MediaResult<PathBuf> {
        let output = processed_path(input);
        match self.mode {
            Rewrite::Copy => {
                tokio::fs::copy(input, &output).await?;
                Ok(output)
            }
            Rewrite::Fail => Err(MediaError::tool_failed("ffmpeg", "conversion failed", None, Some(1))),
            Rewrite::Hang => {
                tokio::fs::write(&output, b"partial").await?;
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(output)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub local_path: PathBuf,
    pub key: String,
    pub content_type: String,
    pub file_existed: bool,
}

pub struct RecordingStore {
    fail: bool,
    uploads: Mutex<Vec<RecordedUpload>>,
}

impl RecordingStore {
    pub fn working() -> Self {
        Self {
            fail: false,
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn upload(
        &self,
        local_path: &Path,
        key: &StorageKey,
        content_type: &str,
    ) -> StorageResult<String> {
        self.uploads.lock().unwrap().push(RecordedUpload {
            local_path: local_path.to_path_buf(),
            key: key.to_string(),
            content_type: content_type.to_string(),
            file_existed: local_path.exists(),
        });
        if self.fail {
            return Err(StorageError::upload_failed("access denied"));
        }
        Ok(format!("{}/{}", TEST_BUCKET_URL, key))
    }
}
