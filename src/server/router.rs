use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

use super::handlers::{chat, health};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/rag", post(chat::rag))
        .route("/api/health", get(health::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
