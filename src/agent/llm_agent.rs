//! The tool-calling loop for a single agent.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::content::{Content, FunctionCall, FunctionResponse, Role};
use super::definition::AgentDefinition;
use super::error::AgentError;
use super::provider::{FunctionDeclaration, GenerateRequest, ModelProvider};
use super::tools::{failure_response, ToolRegistry};
use crate::domain::chat::ToolCallRecord;

/// An agent definition bound to a provider and its tool handlers.
pub struct LlmAgent {
    definition: AgentDefinition,
    provider: Arc<dyn ModelProvider>,
    tools: ToolRegistry,
    declarations: Vec<FunctionDeclaration>,
    max_rounds: usize,
}

/// Contents produced during one turn, starting with the user message.
#[derive(Debug, Clone, Default)]
pub struct AgentTurn {
    pub contents: Vec<Content>,
}

impl AgentTurn {
    fn model_contents(&self) -> impl Iterator<Item = &Content> {
        self.contents.iter().filter(|c| c.role == Role::Model)
    }

    /// All model text of the turn, joined with newlines.
    pub fn response_text(&self) -> String {
        self.model_contents()
            .filter_map(Content::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Text of the last model reply, i.e. the agent's answer.
    pub fn final_text(&self) -> Option<String> {
        self.model_contents().last().and_then(Content::text)
    }

    pub fn tool_calls(&self) -> Vec<ToolCallRecord> {
        self.model_contents()
            .flat_map(Content::function_calls)
            .map(|call| ToolCallRecord {
                name: call.name.clone(),
                inputs: call.args.clone(),
            })
            .collect()
    }
}

impl LlmAgent {
    pub fn new(
        definition: AgentDefinition,
        provider: Arc<dyn ModelProvider>,
        tools: ToolRegistry,
        max_rounds: usize,
    ) -> Self {
        let declarations = tools.resolve(&definition.tools);
        Self {
            definition,
            provider,
            tools,
            declarations,
            max_rounds,
        }
    }

    pub fn definition(&self) -> &AgentDefinition {
        &self.definition
    }

    /// Run one turn on top of `history`.
    ///
    /// Function calls in a reply are dispatched concurrently and their results
    /// fed back until the model answers without calling anything.
    #[instrument(skip_all, fields(agent = %self.definition.name))]
    pub async fn run_turn(
        &self,
        history: &[Content],
        message: Content,
    ) -> Result<AgentTurn, AgentError> {
        let start = history.len();
        let mut contents = history.to_vec();
        contents.push(message);

        for round in 0..self.max_rounds {
            let response = self
                .provider
                .generate(GenerateRequest {
                    model: &self.definition.model,
                    system_instruction: &self.definition.instruction,
                    contents: &contents,
                    functions: &self.declarations,
                    web_search: self.definition.web_search,
                })
                .await?;

            let reply = response.content;
            let calls: Vec<FunctionCall> = reply.function_calls().cloned().collect();
            contents.push(reply);

            if calls.is_empty() {
                debug!(round, finish_reason = ?response.finish_reason, "Agent answered");
                return Ok(AgentTurn {
                    contents: contents.split_off(start),
                });
            }

            debug!(round, calls = calls.len(), "Dispatching tool calls");
            let responses = join_all(calls.iter().map(|call| self.dispatch(call))).await;
            contents.push(Content::function_responses(responses));
        }

        Err(AgentError::MaxToolRounds(self.max_rounds))
    }

    async fn dispatch(&self, call: &FunctionCall) -> FunctionResponse {
        if !self.definition.tools.contains(&call.name) {
            return failure_response(call, &AgentError::UnknownTool(call.name.clone()));
        }
        self.tools.dispatch(call).await
    }
}
