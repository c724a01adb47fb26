use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use minikart::DirectoryError;
use minikart_store::StoreError;
use serde_json::json;
use thiserror::Error;

/// Unified error type for API handlers.
///
/// Variants carry the client-facing message; store failures are logged and
/// collapsed into a generic 500 so backend detail never leaks into a
/// response body.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request was malformed or failed validation.
    #[error("{0}")]
    BadRequest(String),

    /// Login failed.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The bearer token is missing, malformed, expired, or orphaned.
    #[error("Missing or invalid token")]
    Unauthorized,

    /// The caller is authenticated but may not touch this resource.
    #[error("Not authorized")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    /// The request conflicts with existing state (e.g. a taken email).
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Store(_) | ApiError::Directory(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self {
            ApiError::Store(e) => {
                tracing::error!("store error: {e}");
                "Internal error".to_string()
            }
            ApiError::Directory(e) => {
                tracing::error!("directory error: {e}");
                "Internal error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
