//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{create_video, get_video, health, ready, upload_thumbnail, upload_video};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let api_routes = Router::new()
        .route("/videos", post(create_video))
        .route("/videos/:video_id", get(get_video))
        .route("/video_upload/:video_id", post(upload_video))
        .route("/thumbnail_upload/:video_id", post(upload_thumbnail))
        // Multipart's own 2 MB default would cap videos; the layer below governs instead.
        .layer(DefaultBodyLimit::disable());

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health))
        .route("/ready", get(ready))
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use chrono::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use vingest_media::{processed_path, MediaError, MediaProbe, MediaResult, MediaTransformer};
    use vingest_models::{OrientationClass, UserId, Video};
    use vingest_pipeline::{IngestionPipeline, PipelineConfig, ThumbnailPipeline};
    use vingest_storage::{ObjectStore, StorageError, StorageKey, StorageResult};

    use super::*;
    use crate::config::ApiConfig;
    use crate::store::{MemoryVideoStore, VideoStore};

    const BOUNDARY: &str = "vingest-test-boundary";

    struct PortraitProbe;

    #[async_trait]
    impl MediaProbe for PortraitProbe {
        async fn classify(&self, _path: &Path) -> MediaResult<OrientationClass> {
            Ok(OrientationClass::Portrait)
        }
    }

    struct CopyTransformer;

    #[async_trait]
    impl MediaTransformer for CopyTransformer {
        async fn fast_start_rewrite(&self, input: &Path) -> MediaResult<PathBuf> {
            let output = processed_path(input);
            tokio::fs::copy(input, &output).await?;
            Ok(output)
        }
    }

    /// Stands in for a file ffprobe cannot read.
    struct UnreadableMedia;

    #[async_trait]
    impl MediaProbe for UnreadableMedia {
        async fn classify(&self, _path: &Path) -> MediaResult<OrientationClass> {
            Err(MediaError::tool_failed("ffprobe", "invalid data found", None, Some(1)))
        }
    }

    #[derive(Default)]
    struct KeyRecorder {
        fail: bool,
        keys: Mutex<Vec<String>>,
    }

    impl KeyRecorder {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl ObjectStore for KeyRecorder {
        async fn upload(&self, _path: &Path, key: &StorageKey, _ct: &str) -> StorageResult<String> {
            self.keys.lock().unwrap().push(key.to_string());
            if self.fail {
                return Err(StorageError::upload_failed("access denied"));
            }
            Ok(format!("https://media.example.com/{}", key))
        }
    }

    struct TestApp {
        _dir: TempDir,
        router: Router,
        state: AppState,
        uploads: Arc<KeyRecorder>,
    }

    impl TestApp {
        fn new() -> Self {
            Self::with(Arc::new(PortraitProbe), KeyRecorder::default())
        }

        fn with(classifier: Arc<dyn MediaProbe>, uploads: KeyRecorder) -> Self {
            let dir = TempDir::new().unwrap();
            let pipeline_config = PipelineConfig::default().with_assets_root(dir.path());
            let uploads = Arc::new(uploads);

            let pipeline = IngestionPipeline::with_components(
                pipeline_config.clone(),
                classifier,
                Arc::new(CopyTransformer),
                uploads.clone(),
            );
            let thumbnails = ThumbnailPipeline::new(pipeline_config, uploads.clone());
            let config = ApiConfig {
                jwt_secret: "router-test-secret".to_string(),
                ..ApiConfig::default()
            };
            let state = AppState::new(
                config,
                Arc::new(MemoryVideoStore::new()),
                uploads.clone(),
                pipeline,
                thumbnails,
            );

            Self {
                _dir: dir,
                router: create_router(state.clone(), None),
                state,
                uploads,
            }
        }

        fn token(&self, user: &str) -> String {
            self.state.jwt.issue(&UserId::from(user), Duration::minutes(5)).unwrap()
        }

        async fn seed_video(&self, owner: &str) -> Video {
            let video = Video::new(UserId::from(owner), "clip", "");
            self.state.videos.insert(video.clone()).await;
            video
        }
    }

    fn multipart_body(field: &str, content_type: &str, payload: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"upload\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(payload);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(uri: &str, token: Option<&str>, body: Vec<u8>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"));
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body)).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::new();
        let response = app
            .router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_reports_storage() {
        let app = TestApp::new();
        let response = app
            .router
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["checks"]["storage"]["status"], "ok");
    }

    #[tokio::test]
    async fn test_upload_requires_token() {
        let app = TestApp::new();
        let video = app.seed_video("owner").await;

        let response = app
            .router
            .oneshot(upload_request(
                &format!("/api/video_upload/{}", video.id),
                None,
                multipart_body("video", "video/mp4", b"data"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_upload_by_non_owner_is_forbidden() {
        let app = TestApp::new();
        let video = app.seed_video("owner").await;
        let token = app.token("intruder");

        let response = app
            .router
            .clone()
            .oneshot(upload_request(
                &format!("/api/video_upload/{}", video.id),
                Some(&token),
                multipart_body("video", "video/mp4", b"data"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = json_body(response).await;
        assert_eq!(body["detail"], "Forbidden: Not allowed to modify this video");
        assert!(app.uploads.keys.lock().unwrap().is_empty());
        assert_eq!(app.state.videos.get(&video.id).await.unwrap().video_url, None);
    }

    #[tokio::test]
    async fn test_wrong_media_type_is_bad_request() {
        let app = TestApp::new();
        let video = app.seed_video("owner").await;
        let token = app.token("owner");

        let response = app
            .router
            .clone()
            .oneshot(upload_request(
                &format!("/api/video_upload/{}", video.id),
                Some(&token),
                multipart_body("video", "video/quicktime", b"data"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["detail"].as_str().unwrap().contains("video/quicktime"));
        assert_eq!(app.state.pipeline.temp_files().stats().created, 0);
    }

    #[tokio::test]
    async fn test_missing_field_is_bad_request() {
        let app = TestApp::new();
        let video = app.seed_video("owner").await;
        let token = app.token("owner");

        let response = app
            .router
            .oneshot(upload_request(
                &format!("/api/video_upload/{}", video.id),
                Some(&token),
                multipart_body("thumbnail", "video/mp4", b"data"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["detail"].as_str().unwrap().contains("video file missing"));
    }

    #[tokio::test]
    async fn test_video_upload_attaches_url() {
        let app = TestApp::new();
        let video = app.seed_video("owner").await;
        let token = app.token("owner");

        let response = app
            .router
            .clone()
            .oneshot(upload_request(
                &format!("/api/video_upload/{}", video.id),
                Some(&token),
                multipart_body("video", "video/mp4", b"fake mp4 bytes"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let url = body["video_url"].as_str().unwrap();
        assert!(url.starts_with("https://media.example.com/portrait/"));
        assert!(url.ends_with(".mp4"));

        let keys = app.uploads.keys.lock().unwrap().clone();
        assert_eq!(keys.len(), 1);
        assert_eq!(app.state.pipeline.temp_files().stats().outstanding(), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_leaves_record_unchanged() {
        let app = TestApp::with(Arc::new(PortraitProbe), KeyRecorder::failing());
        let video = app.seed_video("owner").await;
        let token = app.token("owner");

        let response = app
            .router
            .clone()
            .oneshot(upload_request(
                &format!("/api/video_upload/{}", video.id),
                Some(&token),
                multipart_body("video", "video/mp4", b"fake mp4 bytes"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["detail"].as_str().unwrap().contains("access denied"));
        assert_eq!(app.uploads.keys.lock().unwrap().len(), 1);
        assert_eq!(app.state.videos.get(&video.id).await.unwrap().video_url, None);
        assert_eq!(app.state.pipeline.temp_files().stats().outstanding(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_media_leaves_record_unchanged() {
        let app = TestApp::with(Arc::new(UnreadableMedia), KeyRecorder::default());
        let video = app.seed_video("owner").await;
        let token = app.token("owner");

        let response = app
            .router
            .clone()
            .oneshot(upload_request(
                &format!("/api/video_upload/{}", video.id),
                Some(&token),
                multipart_body("video", "video/mp4", b"not really a video"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(app.uploads.keys.lock().unwrap().is_empty());
        let stored = app.state.videos.get(&video.id).await.unwrap();
        assert_eq!(stored.video_url, None);
        assert_eq!(stored.updated_at, video.updated_at);
        assert_eq!(app.state.pipeline.temp_files().stats().outstanding(), 0);
    }

    #[tokio::test]
    async fn test_thumbnail_upload_inline() {
        let app = TestApp::new();
        let video = app.seed_video("owner").await;
        let token = app.token("owner");

        let response = app
            .router
            .clone()
            .oneshot(upload_request(
                &format!("/api/thumbnail_upload/{}", video.id),
                Some(&token),
                multipart_body("thumbnail", "image/png", b"hi"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["thumbnail_url"], "data:image/png;base64,aGk=");
        assert!(app.uploads.keys.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_and_fetch_video() {
        let app = TestApp::new();
        let token = app.token("owner");

        let response = app
            .router
            .clone()
            .oneshot(
                Request::post("/api/videos")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"title":"My clip"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        let id = created["id"].as_str().unwrap().to_string();

        let other = app.token("someone-else");
        let response = app
            .router
            .clone()
            .oneshot(
                Request::get(format!("/api/videos/{id}"))
                    .header(header::AUTHORIZATION, format!("Bearer {other}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .router
            .oneshot(
                Request::get(format!("/api/videos/{id}"))
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["title"], "My clip");
    }
}
