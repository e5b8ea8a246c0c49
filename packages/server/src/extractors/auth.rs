use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use axum_extra::extract::CookieJar;

use crate::auth::Session;
use crate::error::AppError;
use crate::session::GuardState;
use crate::state::AppState;

/// Signed-in administrator, resolved by the session guard.
///
/// The access token is read from `Authorization: Bearer <token>` or, failing
/// that, from the session cookie. Add this as a handler parameter to require
/// a session; handlers that redirect instead take `Result<AdminSession, AppError>`.
pub struct AdminSession(pub Session);

impl AdminSession {
    pub fn subject(&self) -> &str {
        self.0.subject()
    }
}

/// The caller's access token, if any.
pub fn access_token(parts: &Parts, cookie_name: &str) -> Option<String> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(&parts.headers)
        .get(cookie_name)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = access_token(parts, &state.config.admin.cookie_name);
        match state.sessions.resolve(token.as_deref()).await {
            GuardState::SignedIn(session) => Ok(AdminSession(session)),
            _ => Err(AppError::SessionRequired),
        }
    }
}

/// The caller's access token without resolving it.
pub struct AccessToken(pub Option<String>);

impl FromRequestParts<AppState> for AccessToken {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(AccessToken(access_token(
            parts,
            &state.config.admin.cookie_name,
        )))
    }
}
