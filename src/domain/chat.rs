//! Request/response DTOs for the chat and session endpoints.
//!
//! Field names follow what the web client sends (`userId`, `newMessage`, ...).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::build_report::BuildReport;

/// The only role a client may send; model turns come from the provider.
pub const USER_ROLE: &str = "user";

#[derive(Debug, Clone, Deserialize)]
pub struct MessagePart {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    #[serde(default = "default_role")]
    pub role: String,
    pub parts: Vec<MessagePart>,
}

impl ChatMessage {
    pub fn is_from_user(&self) -> bool {
        self.role == USER_ROLE
    }

    /// Non-blank part texts in order, one per model part.
    pub fn part_texts(&self) -> impl Iterator<Item = &str> {
        self.parts
            .iter()
            .map(|p| p.text.as_str())
            .filter(|text| !text.trim().is_empty())
    }

    /// All text parts joined with newlines.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn default_role() -> String {
    USER_ROLE.to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub user_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub app_name: Option<String>,
    pub new_message: ChatMessage,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub user_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreatedResponse {
    pub status: String,
    pub session_id: String,
    pub user_id: String,
}

/// A tool the root agent decided to call during the turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub name: String,
    pub inputs: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub response_text: String,
    pub tool_calls: Vec<ToolCallRecord>,
    pub report: BuildReport,
}

/// Generate a session id in the `s_<uuid>` form used across the service.
pub fn new_session_id() -> String {
    format!("s_{}", uuid::Uuid::new_v4())
}
