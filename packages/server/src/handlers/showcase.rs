use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminSession;
use crate::extractors::json::AppJson;
use crate::models::showcase::{
    ShowcaseForm, ShowcaseListResponse, ShowcaseSubmissionResponse, validate_showcase_item,
};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/showcase",
    tag = "Showcase",
    operation_id = "listShowcase",
    summary = "List showcase items",
    responses(
        (status = 200, description = "Showcase items, newest first", body = ShowcaseListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_showcase(State(state): State<AppState>) -> Json<ShowcaseListResponse> {
    let refreshed = state.showcase.refresh().await;
    Json(ShowcaseListResponse {
        total: refreshed.entries.len() as u64,
        items: refreshed.entries.to_vec(),
        stale: refreshed.stale,
    })
}

#[utoipa::path(
    post,
    path = "/admin/showcase",
    tag = "Admin",
    operation_id = "createShowcaseItem",
    summary = "Add a showcase item",
    description = "Title and an http(s) media URL are required. `item_type` is `video` (default) or `image`.",
    request_body = ShowcaseForm,
    responses(
        (status = 201, description = "Showcase item added", body = ShowcaseSubmissionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "No session (SESSION_REQUIRED)", body = ErrorBody),
        (status = 502, description = "Row store failure (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(session, state, payload), fields(subject = %session.subject(), title = %payload.title))]
pub async fn create_showcase_item(
    session: AdminSession,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ShowcaseForm>,
) -> Result<impl IntoResponse, AppError> {
    let row = validate_showcase_item(&payload)?;

    let item = state.showcase.store().insert(row).await?;
    info!(id = %item.id, kind = %item.item_type, "Showcase item added");
    let refreshed = state.showcase.refresh().await;

    Ok((
        StatusCode::CREATED,
        Json(ShowcaseSubmissionResponse {
            message: "Showcase item added successfully!".into(),
            item,
            items: refreshed.entries.to_vec(),
        }),
    ))
}
