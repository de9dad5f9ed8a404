//! Client for the hosted model's `generateContent` REST API.
//!
//! Transient failures (transport errors, 429 and 5xx gateway statuses) are
//! retried with exponential backoff up to the configured elapsed-time cap.

use anyhow::{Context, Result};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

use crate::agent::{
    AgentError, Content, FunctionDeclaration, GenerateRequest, ModelProvider, ModelResponse, Part,
};
use crate::config::Settings;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini REST client.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    retry_max_elapsed: Duration,
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest<'a> {
    system_instruction: WireInstruction<'a>,
    contents: &'a [Content],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
}

#[derive(Serialize)]
struct WireInstruction<'a> {
    parts: [WireText<'a>; 1],
}

#[derive(Serialize)]
struct WireText<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum WireTool<'a> {
    FunctionDeclarations(&'a [FunctionDeclaration]),
    GoogleSearch {},
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    #[serde(default)]
    content: Option<WireContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

/// Candidate content; blocked candidates may omit parts.
#[derive(Deserialize)]
struct WireContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct WireErrorResponse {
    error: WireError,
}

#[derive(Deserialize)]
struct WireError {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl<'a> WireRequest<'a> {
    fn from_request(request: &GenerateRequest<'a>) -> Self {
        let mut tools = Vec::new();
        if !request.functions.is_empty() {
            tools.push(WireTool::FunctionDeclarations(request.functions));
        }
        if request.web_search {
            tools.push(WireTool::GoogleSearch {});
        }

        Self {
            system_instruction: WireInstruction {
                parts: [WireText {
                    text: request.system_instruction,
                }],
            },
            contents: request.contents,
            tools,
        }
    }
}

impl WireResponse {
    fn into_model_response(self) -> Result<ModelResponse, AgentError> {
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or(AgentError::EmptyResponse)?;

        let parts = candidate.content.map(|c| c.parts).unwrap_or_default();

        Ok(ModelResponse {
            content: Content::model(parts),
            finish_reason: candidate.finish_reason,
        })
    }
}

// =============================================================================
// Client
// =============================================================================

impl GeminiClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.model_timeout())
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = settings.model_api_url.as_str().trim_end_matches('/').to_string();
        tracing::info!(base_url = %base_url, "Model client initialized");

        Ok(Self {
            client,
            base_url,
            api_key: settings.model_api_key.clone(),
            retry_max_elapsed: settings.model_retry_max_elapsed(),
        })
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    /// One attempt, no retry.
    async fn post_once(&self, url: &str, body: &WireRequest<'_>) -> Result<ModelResponse, AgentError> {
        debug!(url = %url, "Model request");

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Model request failed");
                AgentError::Transport(e.to_string())
            })?;

        let status = response.status();

        if status.is_success() {
            response
                .json::<WireResponse>()
                .await
                .map_err(|e| {
                    error!(error = %e, "Failed to parse model response");
                    AgentError::InvalidResponse(e.to_string())
                })?
                .into_model_response()
        } else {
            let message = match response.json::<WireErrorResponse>().await {
                Ok(body) => match body.error.status {
                    Some(code) => format!("{code}: {}", body.error.message),
                    None => body.error.message,
                },
                Err(_) => format!("Model provider error: {status}"),
            };
            warn!(status = %status, message = %message, "Model provider error");
            Err(AgentError::Provider {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl ModelProvider for GeminiClient {
    #[instrument(skip_all, fields(model = %request.model))]
    async fn generate(&self, request: GenerateRequest<'_>) -> Result<ModelResponse, AgentError> {
        let url = self.generate_url(request.model);
        let body = WireRequest::from_request(&request);

        let policy = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(self.retry_max_elapsed))
            .build();

        let url = &url;
        let body = &body;
        backoff::future::retry(policy, move || async move {
            self.post_once(url, body).await.map_err(|e| {
                if e.is_transient() {
                    debug!(error = %e, "Retrying model request");
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        })
        .await
    }

    async fn health_check(&self) -> Result<(), AgentError> {
        let url = format!("{}/v1beta/models", self.base_url);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(AgentError::Provider {
                status: status.as_u16(),
                message: "Model provider health check failed".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Role;
    use serde_json::json;

    fn declaration() -> FunctionDeclaration {
        FunctionDeclaration {
            name: "calculate_build_metrics".into(),
            description: "metrics".into(),
            parameters: json!({ "type": "object" }),
        }
    }

    #[test]
    fn request_body_uses_provider_field_names() {
        let contents = vec![Content::user_text("budget 4000 MYR")];
        let functions = vec![declaration()];
        let request = GenerateRequest {
            model: "gemini-2.5-pro",
            system_instruction: "be helpful",
            contents: &contents,
            functions: &functions,
            web_search: false,
        };

        let body = serde_json::to_value(WireRequest::from_request(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "systemInstruction": { "parts": [{ "text": "be helpful" }] },
                "contents": [{ "role": "user", "parts": [{ "text": "budget 4000 MYR" }] }],
                "tools": [{ "functionDeclarations": [{
                    "name": "calculate_build_metrics",
                    "description": "metrics",
                    "parameters": { "type": "object" }
                }] }]
            })
        );
    }

    #[test]
    fn web_search_only_request() {
        let contents = vec![Content::user_text("RTX 4070 price")];
        let request = GenerateRequest {
            model: "gemini-2.5-flash",
            system_instruction: "research",
            contents: &contents,
            functions: &[],
            web_search: true,
        };

        let body = serde_json::to_value(WireRequest::from_request(&request)).unwrap();
        assert_eq!(body["tools"], json!([{ "googleSearch": {} }]));
    }

    #[test]
    fn no_tools_omits_the_key() {
        let contents = vec![Content::user_text("hi")];
        let request = GenerateRequest {
            model: "m",
            system_instruction: "",
            contents: &contents,
            functions: &[],
            web_search: false,
        };
        let body = serde_json::to_value(WireRequest::from_request(&request)).unwrap();
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn parses_function_call_candidate() {
        let wire: WireResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "functionCall": {
                        "name": "research_agent",
                        "args": { "request": "B650 boards" }
                    } }]
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "totalTokenCount": 12 }
        }))
        .unwrap();

        let response = wire.into_model_response().unwrap();
        assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
        let call = response.content.function_calls().next().unwrap();
        assert_eq!(call.name, "research_agent");
        assert_eq!(call.args["request"], "B650 boards");
    }

    #[test]
    fn blocked_candidate_has_no_parts() {
        let wire: WireResponse = serde_json::from_value(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        }))
        .unwrap();
        let response = wire.into_model_response().unwrap();
        assert!(response.content.parts.is_empty());
        assert_eq!(response.content.role, Role::Model);
    }

    #[test]
    fn empty_candidates_is_an_error() {
        let wire: WireResponse = serde_json::from_value(json!({ "candidates": [] })).unwrap();
        assert!(matches!(
            wire.into_model_response(),
            Err(AgentError::EmptyResponse)
        ));
    }
}
