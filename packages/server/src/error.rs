use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::auth::AuthError;
use crate::models::shared::{FieldError, FieldErrors};
use crate::rows::RowStoreError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `SESSION_REQUIRED`,
    /// `INVALID_CREDENTIALS`, `NOT_FOUND`, `UPSTREAM_ERROR`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Title is required")]
    pub message: String,
    /// Per-field messages for form validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// One or more form fields failed validation.
    InvalidFields(FieldErrors),
    /// No valid session accompanies a request to the admin surface.
    SessionRequired,
    /// The auth provider refused the credentials. Carries the message shown to the user.
    InvalidCredentials(String),
    NotFound(String),
    /// A hosted service call failed. Carries the message shown to the user;
    /// the underlying cause is logged where the error is created.
    Upstream(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                    fields: None,
                },
            ),
            AppError::InvalidFields(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: errors.summary(),
                    fields: Some(errors.into_inner()),
                },
            ),
            AppError::SessionRequired => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "SESSION_REQUIRED",
                    message: "Sign in to continue".into(),
                    fields: None,
                },
            ),
            AppError::InvalidCredentials(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: msg,
                    fields: None,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                    fields: None,
                },
            ),
            AppError::Upstream(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorBody {
                    code: "UPSTREAM_ERROR",
                    message: msg,
                    fields: None,
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                        fields: None,
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::InvalidFields(errors)
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<RowStoreError> for AppError {
    fn from(err: RowStoreError) -> Self {
        tracing::error!("Row store error: {err}");
        AppError::Upstream("Could not save the entry. Please try again.".into())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        tracing::error!("Object storage error: {err}");
        AppError::Upstream("Could not store the file. Please try again.".into())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        tracing::error!("Auth provider error: {err}");
        AppError::Upstream("The sign-in service is unavailable. Please try again.".into())
    }
}
