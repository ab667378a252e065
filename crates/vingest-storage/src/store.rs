//! Object store abstraction.

use std::path::Path;

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::keys::StorageKey;

/// Durable remote storage for local files.
///
/// Implementations store the file under exactly `key` and never compute
/// keys themselves. There is no retry: failures propagate to the caller.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `local_path` under `key` and return its durable URL.
    async fn upload(
        &self,
        local_path: &Path,
        key: &StorageKey,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Cheap reachability check for readiness probes.
    async fn check_connectivity(&self) -> StorageResult<()> {
        Ok(())
    }
}
