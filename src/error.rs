use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Request-level error taxonomy. Every variant maps to one status code and a
/// `{"error": …}` JSON envelope; internal errors are logged and surfaced as an
/// opaque 500 so no detail leaks to the client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not logged in")]
    AuthRequired,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Email already registered")]
    AlreadyExists,
    #[error("Task not found")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::AuthRequired | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::AlreadyExists => StatusCode::CONFLICT,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Internal(e) => {
                error!(error = %e, "request failed");
                "Something went wrong".to_string()
            }
            other => other.to_string(),
        };
        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}
