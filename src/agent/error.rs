use thiserror::Error;

use crate::services::sessions::SessionError;
use crate::validation::ValidationErrors;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Model provider unavailable: {0}")]
    Transport(String),

    #[error("Model provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Invalid model provider response: {0}")]
    InvalidResponse(String),

    #[error("Model returned no candidates")]
    EmptyResponse,

    #[error("Tool call limit of {0} rounds reached")]
    MaxToolRounds(usize),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid tool arguments: {0}")]
    ToolArguments(ValidationErrors),

    #[error("Final output does not match the build report schema: {0}")]
    ContractViolation(ValidationErrors),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    /// Whether retrying the same provider request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Provider { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(AgentError::Transport("reset".into()).is_transient());
        assert!(AgentError::Provider { status: 429, message: "slow down".into() }.is_transient());
        assert!(AgentError::Provider { status: 503, message: "busy".into() }.is_transient());
        assert!(!AgentError::Provider { status: 400, message: "bad".into() }.is_transient());
        assert!(!AgentError::EmptyResponse.is_transient());
    }
}
