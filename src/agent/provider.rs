//! Seam between the orchestration loop and the hosted model.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::content::Content;
use super::error::AgentError;

/// A callable function advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: Value,
}

/// One generation request: instruction, history and available tools.
#[derive(Debug, Clone, Copy)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub system_instruction: &'a str,
    pub contents: &'a [Content],
    pub functions: &'a [FunctionDeclaration],
    pub web_search: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelResponse {
    pub content: Content,
    pub finish_reason: Option<String>,
}

#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Produce the model's next content for the given history.
    async fn generate(&self, request: GenerateRequest<'_>) -> Result<ModelResponse, AgentError>;

    /// Cheap reachability probe used by the health endpoint.
    async fn health_check(&self) -> Result<(), AgentError>;
}
