use std::convert::Infallible;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::Utc;
use futures::stream::{self, Stream};
use tracing::{instrument, warn};

use crate::auth::AuthError;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AccessToken, AdminSession};
use crate::extractors::json::AppJson;
use crate::models::auth::{
    GuardEvent, LoginRequest, LoginResponse, SessionResponse, validate_login_request,
};
use crate::session::GuardState;
use crate::state::AppState;

const SIGN_IN_FALLBACK: &str = "Failed to sign in. Please check your credentials.";

fn session_cookie(name: String, token: String, max_age: Option<time::Duration>) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    if let Some(max_age) = max_age {
        cookie.set_max_age(max_age);
    }
    cookie
}

/// Exchange an email and password for a session.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Sign in with email and password",
    description = "Validates the credentials' shape, then exchanges them with the auth provider. On success the access token is returned and also set as an HttpOnly cookie, and `redirect_to` names the admin surface.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Credentials refused (INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 502, description = "Auth provider unavailable (UPSTREAM_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, jar, payload), fields(email = %payload.email))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    validate_login_request(&payload)?;

    let session = state
        .auth
        .sign_in_with_password(payload.email.trim(), &payload.password)
        .await
        .map_err(|e| match e {
            AuthError::Rejected(message) => {
                AppError::InvalidCredentials(message.unwrap_or_else(|| SIGN_IN_FALLBACK.into()))
            }
            other => AppError::from(other),
        })?;

    let max_age = session
        .expires_at
        .map(|at| time::Duration::seconds((at - Utc::now()).num_seconds().max(0)));
    let jar = jar.add(session_cookie(
        state.config.admin.cookie_name.clone(),
        session.access_token.clone(),
        max_age,
    ));

    Ok((
        jar,
        Json(LoginResponse {
            subject: session.user_id,
            email: session.email,
            access_token: session.access_token,
            expires_at: session.expires_at,
            redirect_to: state.config.admin.home_path.clone(),
        }),
    ))
}

/// End the caller's session and clear the cookie.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    operation_id = "logout",
    summary = "Sign out",
    description = "Signs the session out at the auth provider, revokes the token on this server and clears the session cookie. Succeeds without a session.",
    responses(
        (status = 204, description = "Signed out"),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    session: Result<AdminSession, AppError>,
) -> impl IntoResponse {
    if let Ok(AdminSession(session)) = session
        && let Err(e) = state.sessions.sign_out(&session).await
    {
        warn!("Provider sign-out failed, token revoked locally: {}", e);
    }

    // Sent whether or not the request carried the cookie.
    let cleared = session_cookie(
        state.config.admin.cookie_name.clone(),
        String::new(),
        Some(time::Duration::ZERO),
    );
    (jar.add(cleared), StatusCode::NO_CONTENT)
}

/// Report whether the caller holds a session.
#[utoipa::path(
    get,
    path = "/auth/session",
    tag = "Auth",
    operation_id = "getSession",
    summary = "Current session",
    description = "Resolves the caller's access token (bearer header or session cookie). Absence of a session is not an error.",
    responses(
        (status = 200, description = "Session state", body = SessionResponse),
    ),
    security((), ("jwt" = [])),
)]
#[instrument(skip_all)]
pub async fn session(
    State(state): State<AppState>,
    AccessToken(token): AccessToken,
) -> Json<SessionResponse> {
    match state.sessions.resolve(token.as_deref()).await {
        GuardState::SignedIn(session) => Json(SessionResponse::from(&session)),
        _ => Json(SessionResponse::signed_out()),
    }
}

/// Stream the session guard's state for the caller's token.
#[utoipa::path(
    get,
    path = "/auth/session/events",
    tag = "Auth",
    operation_id = "watchSession",
    summary = "Follow session state",
    description = "Server-sent `session` events: `pending` first, then the resolution, then `signed_out` if the session ends while the stream is open. The stream closes after `signed_out`.",
    responses(
        (status = 200, description = "Event stream of guard states", content_type = "text/event-stream", body = GuardEvent),
    ),
    security((), ("jwt" = [])),
)]
#[instrument(skip_all)]
pub async fn session_events(
    State(state): State<AppState>,
    AccessToken(token): AccessToken,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.sessions.watch(token);
    let login_path = state.sessions.login_path().to_string();

    let events = stream::unfold(Some((rx, true)), move |next| {
        let login_path = login_path.clone();
        async move {
            let (mut rx, first) = next?;
            if !first && rx.changed().await.is_err() {
                return None;
            }
            let current = rx.borrow_and_update().clone();
            let body = GuardEvent::new(&current, &login_path);
            let event = Event::default()
                .event("session")
                .json_data(&body)
                .unwrap_or_else(|_| Event::default().event("session").data(body.state));
            let more = (current != GuardState::SignedOut).then_some((rx, false));
            Some((Ok(event), more))
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
