//! Agent configuration.
//!
//! An [`AgentDefinition`] is pure config: name, model, instruction and the
//! names of the tools it may call. Tool handlers live in a
//! [`ToolRegistry`](super::tools::ToolRegistry).

use super::prompts;

pub const ROOT_AGENT_NAME: &str = "SiliconSageAgent";
pub const RESEARCH_AGENT_NAME: &str = "research_agent";

#[derive(Debug, Clone, Default)]
pub struct AgentDefinition {
    /// Identifier, also the tool name when the agent is exposed as a tool.
    pub name: String,
    /// Shown to a parent agent as the tool description.
    pub description: String,
    /// Provider model id.
    pub model: String,
    /// System instruction sent with every request.
    pub instruction: String,
    /// Names of registered tools this agent may call.
    pub tools: Vec<String>,
    /// Let the provider ground answers with its own web search.
    pub web_search: bool,
}

impl AgentDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn tool(mut self, name: impl Into<String>) -> Self {
        self.tools.push(name.into());
        self
    }

    pub fn with_web_search(mut self) -> Self {
        self.web_search = true;
        self
    }

    /// The build advisor the chat endpoints talk to.
    pub fn silicon_sage(model: impl Into<String>) -> Self {
        Self::new(ROOT_AGENT_NAME)
            .description("Designs a complete, compatible PC build within the user's budget.")
            .model(model)
            .instruction(prompts::SILICON_SAGE_INSTRUCTION)
            .tool(RESEARCH_AGENT_NAME)
            .tool(super::tools::CALCULATE_BUILD_METRICS)
    }

    /// Search-backed part lookup, used by the advisor as a tool.
    pub fn research(model: impl Into<String>) -> Self {
        Self::new(RESEARCH_AGENT_NAME)
            .description(prompts::RESEARCH_AGENT_DESCRIPTION)
            .model(model)
            .instruction(prompts::RESEARCH_AGENT_INSTRUCTION)
            .with_web_search()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_agent_wires_research_and_calculator() {
        let agent = AgentDefinition::silicon_sage("gemini-2.5-pro");
        assert_eq!(agent.name, ROOT_AGENT_NAME);
        assert_eq!(agent.tools, vec!["research_agent", "calculate_build_metrics"]);
        assert!(!agent.web_search);
    }

    #[test]
    fn research_agent_only_searches() {
        let agent = AgentDefinition::research("gemini-2.5-flash");
        assert!(agent.tools.is_empty());
        assert!(agent.web_search);
        assert_eq!(agent.model, "gemini-2.5-flash");
    }
}
