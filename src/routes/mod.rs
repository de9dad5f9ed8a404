pub mod chat;
pub mod health;
pub mod sessions;
pub mod tools;

use axum::{routing::get, routing::post, Router};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        // Conversation
        .route("/session", post(sessions::create_session))
        .route("/chat", post(chat::chat))
        .route("/api/build", post(chat::generate_build))
        // Deterministic tools
        .route(
            "/tools/calculate-build-metrics",
            post(tools::calculate_build_metrics),
        )
        .route(
            "/schemas/build-request/validate",
            post(tools::validate_request),
        )
        .route(
            "/schemas/build-report/validate",
            post(tools::validate_report),
        )
}
