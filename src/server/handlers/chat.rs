use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::core::security::{require_api_key, require_user_id};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RagRequest {
    pub query: Option<String>,
}

/// Chat entry point. Authentication fails closed before any history write;
/// everything after it is the engine's state machine.
pub async fn rag(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RagRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_api_key(&headers, &state.session_token)?;
    let user_id = require_user_id(&headers)?;

    let query = payload
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| {
            ApiError::BadRequest(
                "The request must include a \"query\" field in the JSON payload.".to_string(),
            )
        })?;

    let response = state.engine.handle(&user_id, query).await?;
    Ok(Json(json!({ "response": response })))
}
