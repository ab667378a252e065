//! Public URL composition for stored objects.

use url::Url;

use crate::error::{StorageError, StorageResult};
use crate::keys::StorageKey;

/// Builds the durable reference for a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicUrlTemplate {
    /// `https://<bucket>.s3.<region>.amazonaws.com/<key>`
    VirtualHosted { bucket: String, region: String },
    /// `<base>/<key>`, for CDNs and S3-compatible providers
    BaseUrl(Url),
}

impl PublicUrlTemplate {
    pub fn virtual_hosted(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self::VirtualHosted {
            bucket: bucket.into(),
            region: region.into(),
        }
    }

    /// Parse an `http(s)://` base URL.
    pub fn base_url(base: &str) -> StorageResult<Self> {
        let url = Url::parse(base)
            .map_err(|e| StorageError::config_error(format!("invalid public base URL {}: {}", base, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(Self::BaseUrl(url)),
            other => Err(StorageError::config_error(format!(
                "unsupported public base URL scheme: {}",
                other
            ))),
        }
    }

    /// Fully qualified URL for `key`.
    pub fn url_for(&self, key: &StorageKey) -> String {
        let path = encode_key(key);
        match self {
            PublicUrlTemplate::VirtualHosted { bucket, region } => {
                format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, path)
            }
            PublicUrlTemplate::BaseUrl(base) => {
                format!("{}/{}", base.as_str().trim_end_matches('/'), path)
            }
        }
    }
}

/// Percent-encode each path segment of the key, keeping the separators.
fn encode_key(key: &StorageKey) -> String {
    key.as_str()
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use vingest_models::OrientationClass;

    #[test]
    fn test_virtual_hosted_url() {
        let key = StorageKey::for_video(OrientationClass::Portrait, "tok", "mp4").unwrap();
        let template = PublicUrlTemplate::virtual_hosted("tubes", "us-east-2");
        assert_eq!(
            template.url_for(&key),
            "https://tubes.s3.us-east-2.amazonaws.com/portrait/tok.mp4"
        );
    }

    #[test]
    fn test_base_url() {
        let key = StorageKey::for_thumbnail("tok", "jpeg").unwrap();
        let template = PublicUrlTemplate::base_url("https://cdn.example.com/media/").unwrap();
        assert_eq!(
            template.url_for(&key),
            "https://cdn.example.com/media/thumbnails/tok.jpeg"
        );
    }

    #[test]
    fn test_base_url_rejects_other_schemes() {
        assert!(PublicUrlTemplate::base_url("ftp://example.com").is_err());
        assert!(PublicUrlTemplate::base_url("not a url").is_err());
    }
}
