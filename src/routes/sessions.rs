use axum::{extract::rejection::JsonRejection, extract::State, Json};
use std::sync::Arc;

use crate::app::AppState;
use crate::domain::chat::{CreateSessionRequest, SessionCreatedResponse};
use crate::error::ApiResult;

/// Create a conversation session.
///
/// POST /session
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> ApiResult<Json<SessionCreatedResponse>> {
    let Json(req) = body?;

    let session = state
        .runner
        .create_session(&req.user_id, req.session_id)
        .await?;

    Ok(Json(SessionCreatedResponse {
        status: "created".to_string(),
        session_id: session.key.session_id,
        user_id: session.key.user_id,
    }))
}
