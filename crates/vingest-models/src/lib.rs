//! Shared data models for the vingest backend.
//!
//! This crate provides Serde-serializable types for:
//! - Video records and their owners
//! - Upload requests and media-type policy
//! - Orientation classes used to namespace storage keys

pub mod orientation;
pub mod upload;
pub mod video;

// Re-export common types
pub use orientation::OrientationClass;
pub use upload::{
    MediaKind, UploadRequest, ACCEPTED_THUMBNAIL_TYPES, ACCEPTED_VIDEO_TYPES, MAX_THUMBNAIL_BYTES,
    MAX_VIDEO_BYTES,
};
pub use video::{UserId, Video, VideoId};
