use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Message returned to callers whenever an internal step fails. Details stay
/// in the tracing log.
pub const GENERIC_FAILURE: &str = "An error occurred while processing the request.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("service unavailable")]
    ServiceUnavailable,
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::ServiceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service unavailable".to_string(),
            ),
            // Internal details never leave the process.
            ApiError::Internal(msg) => {
                tracing::error!("internal error surfaced to caller: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_string())
            }
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

/// Errors raised by the catalog ingestion pipeline. A fetch or parse failure
/// is scoped to one department; callers log it and keep going.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("failed to parse catalog content: {0}")]
    Parse(String),
    #[error("embedding backend failed after {attempts} attempts: {reason}")]
    Embedding { attempts: u32, reason: String },
    #[error("record store failure: {0}")]
    Store(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl IngestError {
    pub fn fetch<E: std::fmt::Display>(url: &str, err: E) -> Self {
        IngestError::Fetch {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}
