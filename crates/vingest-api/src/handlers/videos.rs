//! Video record and upload handlers.

use axum::body::Bytes;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use vingest_models::{MediaKind, UploadRequest, Video, VideoId};
use vingest_pipeline::IngestError;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::store::RecordField;

/// Multipart field carrying the video payload.
pub const VIDEO_FIELD: &str = "video";
/// Multipart field carrying the thumbnail payload.
pub const THUMBNAIL_FIELD: &str = "thumbnail";

#[derive(Debug, Deserialize)]
pub struct CreateVideoRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Create a draft video record owned by the caller.
pub async fn create_video(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateVideoRequest>,
) -> ApiResult<(StatusCode, Json<Video>)> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("Title is required"));
    }

    let video = Video::new(user.user_id, title, request.description);
    state.videos.insert(video.clone()).await;

    info!(video_id = %video.id, user_id = %video.user_id, "Created video record");
    Ok((StatusCode::CREATED, Json(video)))
}

pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    user: AuthUser,
) -> ApiResult<Json<Video>> {
    let video_id = parse_video_id(&video_id)?;

    match state.videos.get(&video_id).await {
        Some(video) if video.is_owned_by(&user.user_id) => Ok(Json(video)),
        _ => Err(ApiError::not_found("Video not found")),
    }
}

/// Upload the video file for a record and attach its durable URL.
pub async fn upload_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    user: AuthUser,
    multipart: Multipart,
) -> ApiResult<Json<Video>> {
    let max_bytes = state.pipeline.config().max_video_bytes;
    let request =
        accept_upload(&state, &video_id, &user, multipart, MediaKind::Video, max_bytes).await?;
    let video_id = request.video_id.clone();

    let outcome = state.pipeline.ingest(request).await?;

    attach(&state, &video_id, RecordField::VideoUrl, outcome.reference).await
}

/// Upload a thumbnail for a record and attach its reference.
pub async fn upload_thumbnail(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    user: AuthUser,
    multipart: Multipart,
) -> ApiResult<Json<Video>> {
    let max_bytes = state.thumbnails.config().max_thumbnail_bytes;
    let request =
        accept_upload(&state, &video_id, &user, multipart, MediaKind::Thumbnail, max_bytes).await?;
    let video_id = request.video_id.clone();

    let reference = state.thumbnails.ingest(request).await?;

    attach(&state, &video_id, RecordField::ThumbnailUrl, reference).await
}

/// Pull the file out of the body, enforce the size cap, then check
/// ownership. Media-type checks are left to the pipeline.
async fn accept_upload(
    state: &AppState,
    video_id: &str,
    user: &AuthUser,
    mut multipart: Multipart,
    kind: MediaKind,
    max_bytes: u64,
) -> ApiResult<UploadRequest> {
    let video_id = parse_video_id(video_id)?;
    let field_name = match kind {
        MediaKind::Video => VIDEO_FIELD,
        MediaKind::Thumbnail => THUMBNAIL_FIELD,
    };

    let (payload, media_type) = read_file_field(&mut multipart, field_name)
        .await?
        .filter(|(payload, _)| !payload.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("{} file missing", kind.as_str())))?;

    if payload.len() as u64 > max_bytes {
        return Err(ApiError::bad_request(format!(
            "{} exceeds {} bytes",
            kind.as_str(),
            max_bytes
        )));
    }

    match state.videos.get(&video_id).await {
        Some(video) if video.is_owned_by(&user.user_id) => {}
        _ => return Err(IngestError::forbidden("Not allowed to modify this video").into()),
    }

    Ok(UploadRequest::new(video_id, user.user_id.clone(), payload, media_type))
}

async fn read_file_field(
    multipart: &mut Multipart,
    name: &str,
) -> ApiResult<Option<(Bytes, String)>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(name) {
            continue;
        }
        let media_type = field.content_type().unwrap_or_default().to_string();
        let payload = field.bytes().await?;
        return Ok(Some((payload, media_type)));
    }
    Ok(None)
}

async fn attach(
    state: &AppState,
    video_id: &VideoId,
    field: RecordField,
    reference: String,
) -> ApiResult<Json<Video>> {
    state
        .videos
        .set_reference(video_id, field, reference)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Video not found"))
}

fn parse_video_id(raw: &str) -> ApiResult<VideoId> {
    let valid = !raw.is_empty()
        && raw.len() <= 64
        && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(ApiError::bad_request("Invalid video ID format"));
    }
    Ok(VideoId::from_string(raw))
}
