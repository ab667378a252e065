//! S3 object storage for ingested media.
//!
//! This crate provides:
//! - The [`ObjectStore`] trait the pipeline uploads through
//! - An S3 implementation (AWS or any S3-compatible endpoint)
//! - Storage key composition and public URL templates

pub mod client;
pub mod error;
pub mod keys;
pub mod public_url;
pub mod store;

pub use client::{S3Config, S3ObjectStore};
pub use error::{StorageError, StorageResult};
pub use keys::{StorageKey, THUMBNAIL_PREFIX};
pub use public_url::PublicUrlTemplate;
pub use store::ObjectStore;
