//! Conversation endpoints backed by the build advisor.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;

use crate::agent::{Content, Part};
use crate::api::DataResponse;
use crate::app::AppState;
use crate::domain::build_report::BuildReport;
use crate::domain::build_request::{parse_message_text, validate_build_request};
use crate::domain::chat::{ChatRequest, ChatResponse};
use crate::error::{ApiError, ApiResult};
use crate::middleware::request_id;

/// Run one chat turn.
///
/// POST /chat
pub async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let Json(req) = body?;

    if let Some(app_name) = &req.app_name {
        if app_name != state.runner.app_name() {
            return Err(ApiError::NotFound(format!("App not found: {app_name}")));
        }
    }

    if !req.new_message.is_from_user() {
        return Err(ApiError::BadRequest(format!(
            "Unsupported message role: {}",
            req.new_message.role
        )));
    }

    let text = req.new_message.text();
    if text.trim().is_empty() {
        return Err(ApiError::BadRequest("Message has no text".to_string()));
    }
    // Structured requests must be well-formed before the model sees them.
    parse_message_text(&text)?;

    let key = state
        .runner
        .ensure_session(&req.user_id, req.session_id)
        .await?;

    tracing::info!(
        request_id = request_id(&headers).unwrap_or_default(),
        session_id = %key.session_id,
        "Chat turn"
    );

    let parts = req.new_message.part_texts().map(Part::text).collect();
    let outcome = state.runner.run(&key, Content::user(parts)).await?;

    Ok(Json(ChatResponse {
        session_id: outcome.session_id,
        response_text: outcome.response_text,
        tool_calls: outcome.tool_calls,
        report: outcome.report,
    }))
}

/// Produce a build report for a structured request in a fresh session.
///
/// POST /api/build
pub async fn generate_build(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<DataResponse<BuildReport>> {
    let Json(payload) = body?;
    let request = validate_build_request(&payload)?;

    let key = state.runner.ensure_session("dashboard", None).await?;

    tracing::info!(
        request_id = request_id(&headers).unwrap_or_default(),
        session_id = %key.session_id,
        budget_cap = request.financials.budget_cap,
        currency = request.financials.currency(),
        "Build report requested"
    );

    let message = serde_json::to_string(&request).map_err(anyhow::Error::from)?;
    let outcome = state.runner.run(&key, Content::user_text(message)).await?;

    Ok(DataResponse::new(outcome.report))
}
