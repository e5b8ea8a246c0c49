use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminSession;
use crate::extractors::json::AppJson;
use crate::models::case_study::{
    CaseStudy, CaseStudyForm, CaseStudyListResponse, CaseStudySubmissionResponse,
    validate_case_study,
};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/case-studies",
    tag = "Case Studies",
    operation_id = "listCaseStudies",
    summary = "List case studies",
    description = "Returns every case study newest first. `stale` is true when the row store could not be reached and the last known listing is served.",
    responses(
        (status = 200, description = "Case studies, newest first", body = CaseStudyListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_case_studies(State(state): State<AppState>) -> Json<CaseStudyListResponse> {
    let refreshed = state.case_studies.refresh().await;
    Json(CaseStudyListResponse {
        total: refreshed.entries.len() as u64,
        case_studies: refreshed.entries.to_vec(),
        stale: refreshed.stale,
    })
}

#[utoipa::path(
    get,
    path = "/case-studies/{id}",
    tag = "Case Studies",
    operation_id = "getCaseStudy",
    summary = "Get a case study by ID",
    params(("id" = Uuid, Path, description = "Case study ID")),
    responses(
        (status = 200, description = "Case study", body = CaseStudy),
        (status = 404, description = "Case study not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id = %id))]
pub async fn get_case_study(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CaseStudy>, AppError> {
    let refreshed = state.case_studies.refresh().await;
    refreshed
        .entries
        .iter()
        .find(|c| c.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Case study not found".into()))
}

#[utoipa::path(
    post,
    path = "/admin/case-studies",
    tag = "Admin",
    operation_id = "createCaseStudy",
    summary = "Add a case study",
    description = "Title, client and category are required; `year` must be between 1900 and 2100.",
    request_body = CaseStudyForm,
    responses(
        (status = 201, description = "Case study added", body = CaseStudySubmissionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "No session (SESSION_REQUIRED)", body = ErrorBody),
        (status = 502, description = "Row store failure (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(session, state, payload), fields(subject = %session.subject(), title = %payload.title))]
pub async fn create_case_study(
    session: AdminSession,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CaseStudyForm>,
) -> Result<impl IntoResponse, AppError> {
    let row = validate_case_study(&payload)?;

    let case_study = state.case_studies.store().insert(row).await?;
    info!(id = %case_study.id, "Case study added");
    let refreshed = state.case_studies.refresh().await;

    Ok((
        StatusCode::CREATED,
        Json(CaseStudySubmissionResponse {
            message: "Case study added successfully!".into(),
            case_study,
            case_studies: refreshed.entries.to_vec(),
        }),
    ))
}
