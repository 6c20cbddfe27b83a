//! Caller identity verification for the chat entry point.
//!
//! Authentication fails closed: a request with a missing or mismatched API
//! key, or without a caller identity, is rejected before any history write
//! or backend call happens.

use std::env;

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::core::errors::ApiError;

const API_KEY_HEADER: &str = "x-api-key";
const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone)]
pub struct SessionToken {
    value: String,
}

impl SessionToken {
    pub fn value(&self) -> &str {
        &self.value
    }
}

pub fn init_session_token() -> SessionToken {
    if let Ok(token) = env::var("ADVISOR_SESSION_TOKEN") {
        if !token.trim().is_empty() {
            return SessionToken { value: token };
        }
    }

    let token = format!("{}{}", Uuid::new_v4(), Uuid::new_v4());
    tracing::warn!("ADVISOR_SESSION_TOKEN not set; generated an ephemeral token");
    tracing::info!("session token: {}", token);
    SessionToken { value: token }
}

pub fn require_api_key(headers: &HeaderMap, expected: &SessionToken) -> Result<(), ApiError> {
    let header_value = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if header_value.is_empty() || header_value != expected.value() {
        return Err(ApiError::Unauthorized);
    }

    Ok(())
}

/// Extracts the authenticated caller id. The transport in front of this
/// service resolves the user's credentials into `x-user-id`; an absent or
/// blank value means no identity was established.
pub fn require_user_id(headers: &HeaderMap) -> Result<String, ApiError> {
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .unwrap_or("");

    if user_id.is_empty() {
        return Err(ApiError::Unauthorized);
    }

    Ok(user_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn token(value: &str) -> SessionToken {
        SessionToken {
            value: value.to_string(),
        }
    }

    #[test]
    fn require_api_key_accepts_valid_header() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("secret"));

        assert!(require_api_key(&headers, &token("secret")).is_ok());
    }

    #[test]
    fn require_api_key_rejects_missing_or_invalid_header() {
        let headers = HeaderMap::new();
        assert!(matches!(
            require_api_key(&headers, &token("secret")),
            Err(ApiError::Unauthorized)
        ));

        let mut invalid = HeaderMap::new();
        invalid.insert(API_KEY_HEADER, HeaderValue::from_static("wrong"));
        assert!(matches!(
            require_api_key(&invalid, &token("secret")),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn require_user_id_rejects_blank_identity() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("  "));
        assert!(matches!(
            require_user_id(&headers),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn require_user_id_returns_trimmed_identity() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("student-42"));
        assert_eq!(require_user_id(&headers).unwrap(), "student-42");
    }
}
