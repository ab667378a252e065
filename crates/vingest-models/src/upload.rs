//! Upload requests and the media-type policy applied to them.

use bytes::Bytes;

use crate::video::{UserId, VideoId};

/// Media types accepted by the video pipeline.
pub const ACCEPTED_VIDEO_TYPES: &[&str] = &["video/mp4"];
/// Media types accepted by the thumbnail pipeline.
pub const ACCEPTED_THUMBNAIL_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Video payload cap (1 GiB).
pub const MAX_VIDEO_BYTES: u64 = 1 << 30;
/// Thumbnail payload cap (10 MiB).
pub const MAX_THUMBNAIL_BYTES: u64 = 10 << 20;

/// Which pipeline an upload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Thumbnail,
}

impl MediaKind {
    /// Exact-match allow-list for this kind.
    pub fn accepted_types(&self) -> &'static [&'static str] {
        match self {
            MediaKind::Video => ACCEPTED_VIDEO_TYPES,
            MediaKind::Thumbnail => ACCEPTED_THUMBNAIL_TYPES,
        }
    }

    pub fn accepts(&self, media_type: &str) -> bool {
        self.accepted_types().contains(&media_type)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Thumbnail => "thumbnail",
        }
    }
}

/// One inbound upload. Lives for a single pipeline invocation.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Target video record (ownership already checked by the caller)
    pub video_id: VideoId,
    /// Authenticated uploader
    pub user_id: UserId,
    /// Raw payload
    pub payload: Bytes,
    /// Declared media type, e.g. `video/mp4`
    pub media_type: String,
}

impl UploadRequest {
    pub fn new(
        video_id: VideoId,
        user_id: UserId,
        payload: impl Into<Bytes>,
        media_type: impl Into<String>,
    ) -> Self {
        Self {
            video_id,
            user_id,
            payload: payload.into(),
            media_type: media_type.into(),
        }
    }

    /// Payload length in bytes.
    pub fn size(&self) -> u64 {
        self.payload.len() as u64
    }

    /// File extension derived from the declared media type (`video/mp4` -> `mp4`).
    ///
    /// The payload is never sniffed.
    pub fn extension(&self) -> Option<&str> {
        extension_for(&self.media_type)
    }
}

/// Subtype of a `type/subtype` media type, used as a file extension.
pub fn extension_for(media_type: &str) -> Option<&str> {
    let (_, subtype) = media_type.split_once('/')?;
    let subtype = subtype.split(';').next().unwrap_or(subtype).trim();
    if subtype.is_empty() || !subtype.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(subtype)
}
