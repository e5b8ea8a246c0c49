use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::{debug, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminSession;
use crate::models::media::{
    LocalFile, SubmissionForm, VideoListQuery, VideoListResponse, VideoSubmissionResponse,
    parse_category_filter,
};
use crate::models::shared::FieldErrors;
use crate::pipeline::MediaUploadPipeline;
use crate::state::AppState;

/// Multipart overhead allowed on top of the two file parts.
const FORM_OVERHEAD: u64 = 1024 * 1024;

/// Public portfolio listing.
#[utoipa::path(
    get,
    path = "/videos",
    tag = "Portfolio",
    operation_id = "listVideos",
    summary = "List portfolio videos",
    description = "Returns every video newest first, optionally filtered by category (`All` or absent means every category). `stale` is true when the row store could not be reached and the last known listing is served.",
    params(VideoListQuery),
    responses(
        (status = 200, description = "Videos, newest first", body = VideoListResponse),
        (status = 400, description = "Unknown category (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(category = ?query.category))]
pub async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<VideoListQuery>,
) -> Result<Json<VideoListResponse>, AppError> {
    let filter = parse_category_filter(query.category.as_deref()).map_err(AppError::Validation)?;

    let refreshed = state.videos.refresh().await;
    let videos: Vec<_> = refreshed
        .entries
        .iter()
        .filter(|v| filter.is_none_or(|c| v.category == c))
        .cloned()
        .collect();

    Ok(Json(VideoListResponse {
        total: videos.len() as u64,
        videos,
        stale: refreshed.stale,
    }))
}

/// Admin view of the video collection.
#[utoipa::path(
    get,
    path = "/admin/videos",
    tag = "Admin",
    operation_id = "adminListVideos",
    summary = "List videos for the admin view",
    responses(
        (status = 200, description = "Videos, newest first", body = VideoListResponse),
        (status = 401, description = "No session (SESSION_REQUIRED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip_all, fields(subject = %session.subject()))]
pub async fn admin_list_videos(
    session: AdminSession,
    State(state): State<AppState>,
) -> Json<VideoListResponse> {
    let refreshed = state.videos.refresh().await;
    Json(VideoListResponse {
        total: refreshed.entries.len() as u64,
        videos: refreshed.entries.to_vec(),
        stale: refreshed.stale,
    })
}

/// Add a video: upload the files, persist the row and return the refreshed listing.
#[utoipa::path(
    post,
    path = "/admin/videos",
    tag = "Admin",
    operation_id = "submitVideo",
    summary = "Add a video",
    description = "Multipart fields: `title`, `category`, optional `description`, either a `video` file or a `video_url`, and optionally either a `thumbnail` file or a `thumbnail_url`. Files are uploaded to object storage before the row is inserted. A failure after the video upload leaves the uploaded file in storage.",
    request_body(content_type = "multipart/form-data", description = "Video submission form"),
    responses(
        (status = 201, description = "Video added", body = VideoSubmissionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "No session (SESSION_REQUIRED)", body = ErrorBody),
        (status = 502, description = "Storage or row store failure (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip_all, fields(subject = %session.subject()))]
pub async fn submit_video(
    session: AdminSession,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_submission(multipart, state.config.storage.max_upload_size).await?;

    let pipeline = MediaUploadPipeline::new(
        state.objects.as_ref(),
        state.videos.as_ref(),
        &state.config.storage,
    );
    let outcome = pipeline
        .run_observed(&form, &mut |stage| {
            debug!(%stage, progress = stage.progress(), "Submission progress");
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(VideoSubmissionResponse {
            message: "Video added successfully!".into(),
            video: outcome.record,
            videos: outcome.listing.entries.to_vec(),
        }),
    ))
}

#[derive(Default)]
struct Slot {
    file: Option<LocalFile>,
    url: Option<String>,
}

impl Slot {
    /// Record an error when both a file and a URL were given.
    fn check(&self, errors: &mut FieldErrors, field: &'static str, label: &str) {
        if self.file.is_some() && self.url.is_some() {
            errors.push(
                field,
                format!("Provide either a {label} file or a {label} URL, not both"),
            );
        }
    }
}

async fn read_submission(
    mut multipart: Multipart,
    max_file_size: u64,
) -> Result<SubmissionForm, AppError> {
    let mut form = SubmissionForm::default();
    let mut video = Slot::default();
    let mut thumbnail = Slot::default();
    let mut errors = FieldErrors::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "video" | "thumbnail" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
                // Browsers send an unnamed empty part when no file was picked.
                if file_name.is_empty() && data.is_empty() {
                    continue;
                }
                let slot: &'static str = if name == "video" { "video" } else { "thumbnail" };
                if data.len() as u64 > max_file_size {
                    errors.push(
                        slot,
                        format!(
                            "File exceeds the {} MB upload limit",
                            max_file_size / (1024 * 1024)
                        ),
                    );
                    continue;
                }
                let file = LocalFile {
                    file_name,
                    content_type,
                    data,
                };
                if slot == "video" {
                    video.file = Some(file);
                } else {
                    thumbnail.file = Some(file);
                }
            }
            _ => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read field {name}: {e}")))?;
                match name.as_str() {
                    "title" => form.title = text,
                    "description" => form.description = text,
                    "category" => form.category = text,
                    "video_url" if !text.trim().is_empty() => video.url = Some(text),
                    "thumbnail_url" if !text.trim().is_empty() => thumbnail.url = Some(text),
                    _ => {}
                }
            }
        }
    }

    video.check(&mut errors, "video", "video");
    thumbnail.check(&mut errors, "thumbnail", "thumbnail");
    if !errors.is_empty() {
        return Err(AppError::InvalidFields(errors));
    }

    match (video.file, video.url) {
        (Some(file), _) => form.select_video_file(Some(file)),
        (None, Some(url)) => form.set_video_url(&url),
        (None, None) => {}
    }
    match (thumbnail.file, thumbnail.url) {
        (Some(file), _) => form.select_thumbnail_file(Some(file)),
        (None, Some(url)) => form.set_thumbnail_url(&url),
        (None, None) => {}
    }
    Ok(form)
}

/// Body limit for the submission route: two files at the per-file limit plus form fields.
pub fn media_upload_body_limit(max_file_size: u64) -> DefaultBodyLimit {
    let limit = max_file_size
        .saturating_mul(2)
        .saturating_add(FORM_OVERHEAD);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}
