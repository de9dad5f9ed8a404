//! Tools the advisor can call and the registry that dispatches them.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::content::{Content, FunctionCall, FunctionResponse};
use super::error::AgentError;
use super::llm_agent::LlmAgent;
use super::provider::FunctionDeclaration;
use crate::domain::metrics::{compute_metrics, parse_components};
use crate::validation::{ValidationErrors, Violation};

pub const CALCULATE_BUILD_METRICS: &str = "calculate_build_metrics";

#[async_trait]
pub trait Tool: Send + Sync {
    fn declaration(&self) -> FunctionDeclaration;

    async fn call(&self, args: Value) -> Result<Value, AgentError>;
}

/// Tool handlers by name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.declaration().name, tool);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Declarations for the named tools, in the given order.
    pub fn resolve(&self, names: &[String]) -> Vec<FunctionDeclaration> {
        names
            .iter()
            .filter_map(|name| match self.tools.get(name) {
                Some(tool) => Some(tool.declaration()),
                None => {
                    warn!(tool = %name, "Agent references an unregistered tool");
                    None
                }
            })
            .collect()
    }

    /// Run one call. Failures become an error payload for the model instead of
    /// aborting the turn.
    pub async fn dispatch(&self, call: &FunctionCall) -> FunctionResponse {
        info!(tool = %call.name, "Tool call");

        let result = match self.tools.get(&call.name) {
            Some(tool) => tool.call(call.args.clone()).await,
            None => Err(AgentError::UnknownTool(call.name.clone())),
        };

        match result {
            Ok(response) => FunctionResponse {
                id: call.id.clone(),
                name: call.name.clone(),
                response,
            },
            Err(e) => failure_response(call, &e),
        }
    }
}

/// Error payload handed back to the model in place of a tool result.
pub fn failure_response(call: &FunctionCall, error: &AgentError) -> FunctionResponse {
    warn!(tool = %call.name, error = %error, "Tool call failed");
    FunctionResponse {
        id: call.id.clone(),
        name: call.name.clone(),
        response: json!({ "status": "error", "error_message": error.to_string() }),
    }
}

// =============================================================================
// calculate_build_metrics
// =============================================================================

/// Wraps the deterministic metrics calculator.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalculateBuildMetricsTool;

#[async_trait]
impl Tool for CalculateBuildMetricsTool {
    fn declaration(&self) -> FunctionDeclaration {
        FunctionDeclaration {
            name: CALCULATE_BUILD_METRICS.to_string(),
            description: "Calculates the total cost, estimated system power draw (including a \
                          50W platform overhead) and the minimum recommended PSU wattage \
                          (20% headroom) for the selected components."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "components": {
                        "type": "array",
                        "description": "Selected components.",
                        "items": {
                            "type": "object",
                            "properties": {
                                "name": { "type": "string", "description": "Component name." },
                                "price": { "type": "number", "description": "Price in the build currency." },
                                "wattage": { "type": "integer", "description": "TDP or estimated power draw in watts." }
                            },
                            "required": ["name"]
                        }
                    }
                },
                "required": ["components"]
            }),
        }
    }

    async fn call(&self, args: Value) -> Result<Value, AgentError> {
        let components = parse_components(&args).map_err(AgentError::ToolArguments)?;
        let report = compute_metrics(&components);
        Ok(serde_json::to_value(report)?)
    }
}

// =============================================================================
// Agent as tool
// =============================================================================

/// Exposes a sub-agent as a tool: one fresh turn per call.
pub struct AgentTool {
    agent: Arc<LlmAgent>,
}

impl AgentTool {
    pub fn new(agent: Arc<LlmAgent>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn declaration(&self) -> FunctionDeclaration {
        let definition = self.agent.definition();
        FunctionDeclaration {
            name: definition.name.clone(),
            description: definition.description.clone(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "request": { "type": "string", "description": "What to look up." }
                },
                "required": ["request"]
            }),
        }
    }

    async fn call(&self, args: Value) -> Result<Value, AgentError> {
        let request = match args.get("request") {
            Some(Value::String(request)) => request.clone(),
            Some(other) => {
                return Err(AgentError::ToolArguments(ValidationErrors::single(
                    Violation::type_mismatch("request", "string", other),
                )))
            }
            None => {
                return Err(AgentError::ToolArguments(ValidationErrors::single(
                    Violation::new(
                        "request",
                        crate::validation::ViolationKind::Missing,
                        "field is required",
                    ),
                )))
            }
        };

        let turn = self
            .agent
            .run_turn(&[], Content::user_text(request))
            .await?;

        Ok(json!({ "result": turn.final_text().unwrap_or_default() }))
    }
}
