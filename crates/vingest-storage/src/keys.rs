//! Storage key composition.
//!
//! Video keys are `<orientation>/<token>.<extension>`; thumbnail keys are
//! `thumbnails/<token>.<extension>`. The token is supplied by the caller
//! and must be freshly generated per upload.

use std::fmt;

use vingest_models::OrientationClass;

use crate::error::{StorageError, StorageResult};

/// Prefix for stored thumbnails.
pub const THUMBNAIL_PREFIX: &str = "thumbnails";

/// A validated object key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// Key for an ingested video, namespaced by orientation.
    pub fn for_video(
        orientation: OrientationClass,
        token: &str,
        extension: &str,
    ) -> StorageResult<Self> {
        Self::compose(orientation.as_str(), token, extension)
    }

    /// Key for a stored thumbnail.
    pub fn for_thumbnail(token: &str, extension: &str) -> StorageResult<Self> {
        Self::compose(THUMBNAIL_PREFIX, token, extension)
    }

    fn compose(prefix: &str, token: &str, extension: &str) -> StorageResult<Self> {
        if !is_key_segment(token) {
            return Err(StorageError::invalid_key(format!("bad token: {:?}", token)));
        }
        if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(StorageError::invalid_key(format!("bad extension: {:?}", extension)));
        }
        Ok(Self(format!("{}/{}.{}", prefix, token, extension)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_key_segment(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
