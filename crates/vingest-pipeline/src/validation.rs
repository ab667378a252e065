//! Upload validation, run before anything touches the disk.

use vingest_models::{MediaKind, UploadRequest};

use crate::error::{IngestError, IngestResult};

/// Check payload presence, size cap and media-type allow-list, in that order.
///
/// Returns the file extension derived from the declared media type.
pub fn validate_upload(
    kind: MediaKind,
    request: &UploadRequest,
    max_bytes: u64,
) -> IngestResult<String> {
    if request.payload.is_empty() {
        return Err(IngestError::validation(format!("{} file missing", kind.as_str())));
    }

    if request.size() > max_bytes {
        return Err(IngestError::validation(format!(
            "{} exceeds {} bytes",
            kind.as_str(),
            max_bytes
        )));
    }

    if !kind.accepts(&request.media_type) {
        return Err(IngestError::validation(format!(
            "Invalid file type: {}",
            request.media_type
        )));
    }

    request
        .extension()
        .map(str::to_string)
        .ok_or_else(|| IngestError::validation(format!("Invalid file type: {}", request.media_type)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vingest_models::{UserId, VideoId};

    fn request(len: usize, media_type: &str) -> UploadRequest {
        UploadRequest::new(VideoId::new(), UserId::from("u"), vec![7u8; len], media_type)
    }

    #[test]
    fn test_accepts_exact_cap() {
        assert_eq!(
            validate_upload(MediaKind::Video, &request(100, "video/mp4"), 100).unwrap(),
            "mp4"
        );
    }

    #[test]
    fn test_rejects_cap_plus_one() {
        let err = validate_upload(MediaKind::Video, &request(101, "video/mp4"), 100).unwrap_err();
        assert!(matches!(err, IngestError::Validation(_)));
    }

    #[test]
    fn test_rejects_disallowed_types() {
        for media_type in ["video/quicktime", "image/png", "", "video/mp4 "] {
            let err = validate_upload(MediaKind::Video, &request(10, media_type), 100).unwrap_err();
            assert!(matches!(err, IngestError::Validation(_)), "{media_type:?}");
        }
    }

    #[test]
    fn test_rejects_empty_payload() {
        let err = validate_upload(MediaKind::Thumbnail, &request(0, "image/png"), 100).unwrap_err();
        assert!(err.to_string().contains("thumbnail file missing"));
    }

    #[test]
    fn test_thumbnail_types() {
        assert_eq!(
            validate_upload(MediaKind::Thumbnail, &request(5, "image/jpeg"), 100).unwrap(),
            "jpeg"
        );
        assert_eq!(
            validate_upload(MediaKind::Thumbnail, &request(5, "image/png"), 100).unwrap(),
            "png"
        );
    }
}
