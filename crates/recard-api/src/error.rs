//! API error type and response mapping.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

/// HTTP-facing error. Each variant owns its status code; bodies are
/// always `{"error": message}`.
#[derive(Debug)]
pub enum ApiError {
    Database(recard_core::Error),
    Unauthorized(String),
    NotFound(String),
    BadRequest(String),
    PreconditionFailed(String),
    Conflict(String),
    Timeout(String),
    UpstreamFailed(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Database(recard_core::Error::Serialization(e.to_string()))
    }
}

impl From<recard_core::Error> for ApiError {
    fn from(err: recard_core::Error) -> Self {
        use recard_core::Error;
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::Validation(msg) => ApiError::BadRequest(msg),
            Error::Precondition(msg) => ApiError::PreconditionFailed(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            Error::Timeout(msg) => ApiError::Timeout(msg),
            Error::Generation(msg) => ApiError::UpstreamFailed(msg),
            other => ApiError::Database(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Database(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::PreconditionFailed(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Timeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
            ApiError::UpstreamFailed(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
