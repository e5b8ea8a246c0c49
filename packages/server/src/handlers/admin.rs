use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, instrument};

use crate::error::AppError;
use crate::extractors::auth::AdminSession;
use crate::models::admin::{AdminOverview, LoginEntry};
use crate::state::AppState;

/// Admin entry point.
///
/// The session is resolved before responding, so a caller is redirected
/// only when resolution found no session.
#[utoipa::path(
    get,
    path = "/admin",
    tag = "Admin",
    operation_id = "adminHome",
    summary = "Admin landing",
    description = "Redirects (303) to the login entry point without a session; otherwise returns an overview of the managed collections.",
    responses(
        (status = 200, description = "Signed in", body = AdminOverview),
        (status = 303, description = "No session; redirect to the login entry point"),
    ),
    security((), ("jwt" = [])),
)]
#[instrument(skip_all)]
pub async fn admin_home(
    State(state): State<AppState>,
    session: Result<AdminSession, AppError>,
) -> Response {
    let Ok(session) = session else {
        debug!("No session, redirecting to login");
        return Redirect::to(state.sessions.login_path()).into_response();
    };

    let (videos, case_studies, showcase) = tokio::join!(
        state.videos.refresh(),
        state.case_studies.refresh(),
        state.showcase.refresh(),
    );

    Json(AdminOverview {
        signed_in_as: session.subject().to_string(),
        videos: videos.entries.len() as u64,
        case_studies: case_studies.entries.len() as u64,
        showcase_items: showcase.entries.len() as u64,
    })
    .into_response()
}

/// Login entry point; a caller who already holds a session goes to the admin surface.
#[utoipa::path(
    get,
    path = "/admin/login",
    tag = "Admin",
    operation_id = "adminLogin",
    summary = "Login entry point",
    responses(
        (status = 200, description = "No session; where to send credentials", body = LoginEntry),
        (status = 303, description = "Already signed in; redirect to the admin surface"),
    ),
)]
#[instrument(skip_all)]
pub async fn admin_login(
    State(state): State<AppState>,
    session: Result<AdminSession, AppError>,
) -> Response {
    let home = state.config.admin.home_path.clone();
    if session.is_ok() {
        return Redirect::to(&home).into_response();
    }
    Json(LoginEntry {
        login_endpoint: "/api/v1/auth/login",
        redirect_to: home,
    })
    .into_response()
}
