use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Session;
use crate::models::shared::FieldErrors;
use crate::session::{GuardDecision, GuardState};

/// Request body for administrator sign-in.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    /// Administrator email address.
    #[schema(example = "admin@example.com")]
    #[serde(default)]
    pub email: String,
    /// Account password.
    #[schema(example = "s3cure_P@ss!")]
    #[serde(default)]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    let email = payload.email.trim();
    if email.is_empty() {
        errors.push("email", "Email is required");
    } else if !looks_like_email(email) {
        errors.push("email", "Email must be a valid address");
    }
    if payload.password.is_empty() {
        errors.push("password", "Password is required");
    }
    errors.finish(|| ())
}

fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !s.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Successful sign-in response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// Provider user id.
    #[schema(example = "8f6c2f4e-3b0a-4f43-9b47-2f7a3f8a1c10")]
    pub subject: String,
    pub email: Option<String>,
    /// Bearer token; also set as an HttpOnly cookie.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
    /// Where the admin surface should navigate next.
    #[schema(example = "/admin")]
    pub redirect_to: String,
}

/// State of the caller's session.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SessionResponse {
    pub signed_in: bool,
    pub subject: Option<String>,
    pub email: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionResponse {
    pub fn signed_out() -> Self {
        Self {
            signed_in: false,
            subject: None,
            email: None,
            expires_at: None,
        }
    }
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            signed_in: true,
            subject: Some(session.user_id.clone()),
            email: session.email.clone(),
            expires_at: session.expires_at,
        }
    }
}

/// One server-sent update of the session guard.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct GuardEvent {
    /// `pending`, `signed_in` or `signed_out`.
    #[schema(example = "signed_in")]
    pub state: &'static str,
    /// `loading`, `redirect` or `render`.
    #[schema(example = "render")]
    pub decision: &'static str,
    #[schema(example = "/admin/login")]
    pub redirect_to: Option<String>,
    #[schema(example = "admin@example.com")]
    pub subject: Option<String>,
}

impl GuardEvent {
    pub fn new(state: &GuardState, login_path: &str) -> Self {
        let state_name = match state {
            GuardState::Pending => "pending",
            GuardState::SignedIn(_) => "signed_in",
            GuardState::SignedOut => "signed_out",
        };
        match state.decide(login_path) {
            GuardDecision::Loading => Self {
                state: state_name,
                decision: "loading",
                redirect_to: None,
                subject: None,
            },
            GuardDecision::Redirect(to) => Self {
                state: state_name,
                decision: "redirect",
                redirect_to: Some(to),
                subject: None,
            },
            GuardDecision::Render { subject } => Self {
                state: state_name,
                decision: "render",
                redirect_to: None,
                subject: Some(subject),
            },
        }
    }
}
