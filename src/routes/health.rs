use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: ServiceHealth,
}

#[derive(Serialize)]
pub struct ServiceHealth {
    pub model_provider: String,
}

/// Health check endpoint. The service still answers schema and metrics calls
/// without the model provider, so an unreachable provider is only `degraded`.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let provider = state.provider.health_check().await;

    if let Err(e) = &provider {
        tracing::warn!(error = %e, "Model provider health check failed");
    }

    let (status, provider_status) = match provider {
        Ok(()) => ("healthy", "ok"),
        Err(_) => ("degraded", "error"),
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services: ServiceHealth {
            model_provider: provider_status.to_string(),
        },
    })
}
