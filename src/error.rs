use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

/// A single field-validation failure, collected express-validator-style so a
/// response can report every bad field at once.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    pub fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

/// The one error taxonomy every handler maps into. Responses carry
/// `{ "message": … }`, or `{ "errors": […] }` for validation failures.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    /// Covers both "no such user" and "wrong password" so the two cases stay
    /// byte-identical on the wire, and the current-password check on update.
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid or expired reset token")]
    InvalidResetToken,
    #[error("{0}")]
    Unauthenticated(&'static str),
    #[error("Not authorized")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Body for endpoints whose success payload is a single confirmation line,
/// mirroring the `{ "message": … }` shape errors use.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

#[derive(Serialize)]
struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

impl ErrorBody {
    fn message(text: String) -> Self {
        Self {
            message: Some(text),
            errors: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    message: None,
                    errors: Some(errors),
                },
            ),
            ApiError::InvalidCredentials => (
                StatusCode::BAD_REQUEST,
                ErrorBody::message("Invalid credentials".into()),
            ),
            ApiError::InvalidResetToken => (
                StatusCode::BAD_REQUEST,
                ErrorBody::message("Invalid or expired reset token".into()),
            ),
            ApiError::Unauthenticated(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorBody::message(msg.into()))
            }
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                ErrorBody::message("Not authorized".into()),
            ),
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                ErrorBody::message(format!("{what} not found")),
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, ErrorBody::message(msg)),
            ApiError::Internal(source) => {
                // The cause goes to the log, never to the client.
                error!(error = %source, "unhandled server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::message("Something went wrong".into()),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Failures surfaced by the storage layer. Uniqueness violations are the only
/// case handlers need to tell apart from plain breakage.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Other(source) => ApiError::Internal(source),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Other(err.into())
    }
}
