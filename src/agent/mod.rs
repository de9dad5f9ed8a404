//! Orchestration: agent definitions, the tool-calling loop, tools and the
//! session-aware runner.

pub mod content;
pub mod definition;
pub mod error;
pub mod llm_agent;
pub mod prompts;
pub mod provider;
pub mod runner;
pub mod test_support;
pub mod tools;

pub use content::{Content, FunctionCall, FunctionResponse, Part, Role};
pub use definition::AgentDefinition;
pub use error::AgentError;
pub use llm_agent::{AgentTurn, LlmAgent};
pub use provider::{FunctionDeclaration, GenerateRequest, ModelProvider, ModelResponse};
pub use runner::{build_advisor, Runner, TurnOutcome};
pub use tools::{AgentTool, CalculateBuildMetricsTool, Tool, ToolRegistry};
