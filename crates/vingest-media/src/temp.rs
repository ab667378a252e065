//! Local temp-file lifecycle for uploads.
//!
//! Every intermediate file the pipeline writes is wrapped in a [`TempAsset`].
//! The asset is deleted exactly once: either explicitly through
//! [`TempAsset::release`] or, on any early return, by its `Drop` impl.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use metrics::counter;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::token::random_token;

/// Counter of temp files removed by `Drop` instead of an explicit release.
pub const TEMP_DROPPED_METRIC: &str = "vingest_temp_files_dropped_total";

#[derive(Debug, Default)]
struct TempCounters {
    created: AtomicU64,
    released: AtomicU64,
}

/// Point-in-time view of a manager's create/delete counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempStats {
    pub created: u64,
    pub released: u64,
}

impl TempStats {
    /// Files created but not yet deleted.
    pub fn outstanding(&self) -> u64 {
        self.created.saturating_sub(self.released)
    }
}

/// Allocates unique paths under the assets root and hands out [`TempAsset`]s.
#[derive(Debug, Clone)]
pub struct TempFileManager {
    root: PathBuf,
    counters: Arc<TempCounters>,
}

impl TempFileManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            counters: Arc::new(TempCounters::default()),
        }
    }

    /// The configured assets root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allocate `<root>/<random token>.<extension>`.
    ///
    /// Uniqueness comes from 256 bits of token entropy, not coordination.
    pub fn allocate(&self, extension: &str) -> PathBuf {
        self.root.join(format!("{}.{}", random_token(), extension))
    }

    /// Write `bytes` to `path`. The file handle is closed on every exit path.
    pub async fn write(&self, path: &Path, bytes: &[u8]) -> MediaResult<()> {
        let mut file = fs::File::create(path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        Ok(())
    }

    /// Delete `path`. Missing files are reported as errors; cleanup callers
    /// check [`MediaError::is_not_found`] and ignore them.
    pub async fn delete(&self, path: &Path) -> MediaResult<()> {
        fs::remove_file(path).await.map_err(MediaError::from)
    }

    /// Allocate a path and write `bytes` to it.
    ///
    /// If the write fails the partially written file is removed before the
    /// error is returned.
    pub async fn stage(&self, extension: &str, bytes: &[u8]) -> MediaResult<TempAsset> {
        fs::create_dir_all(&self.root).await?;

        let asset = self.adopt(self.allocate(extension));
        self.write(asset.path(), bytes).await?;

        debug!("Staged {} bytes at {}", bytes.len(), asset.path().display());
        Ok(asset)
    }

    /// Take ownership of a file some other step created (e.g. a tool output).
    pub fn adopt(&self, path: impl Into<PathBuf>) -> TempAsset {
        self.counters.created.fetch_add(1, Ordering::SeqCst);
        TempAsset {
            path: path.into(),
            counters: Arc::clone(&self.counters),
            released: false,
        }
    }

    /// Create/delete counts for every asset handed out by this manager.
    pub fn stats(&self) -> TempStats {
        TempStats {
            created: self.counters.created.load(Ordering::SeqCst),
            released: self.counters.released.load(Ordering::SeqCst),
        }
    }
}

/// A local file exclusively owned by one pipeline invocation.
#[derive(Debug)]
pub struct TempAsset {
    path: PathBuf,
    counters: Arc<TempCounters>,
    released: bool,
}

impl TempAsset {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now. A file that is already gone is not an error here.
    pub async fn release(mut self) {
        match fs::remove_file(&self.path).await {
            Ok(()) => debug!("Removed temp file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Temp file already gone: {}", self.path.display())
            }
            Err(e) => warn!("Failed to remove temp file {}: {}", self.path.display(), e),
        }
        self.mark_released();
    }

    fn mark_released(&mut self) {
        self.released = true;
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for TempAsset {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if remove_on_drop(&self.path) {
            counter!(TEMP_DROPPED_METRIC).increment(1);
        }
        self.mark_released();
    }
}

/// Synchronous removal for `Drop`. Returns whether this call deleted the file.
fn remove_on_drop(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed temp file {} on drop", path.display());
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!("Failed to remove temp file {} on drop: {}", path.display(), e);
            false
        }
    }
}
