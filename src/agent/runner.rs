//! Session-aware turn execution for the build advisor.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::content::Content;
use super::definition::AgentDefinition;
use super::error::AgentError;
use super::llm_agent::LlmAgent;
use super::provider::ModelProvider;
use super::tools::{AgentTool, CalculateBuildMetricsTool, ToolRegistry};
use crate::config::Settings;
use crate::domain::build_report::BuildReport;
use crate::domain::chat::{new_session_id, ToolCallRecord};
use crate::services::sessions::{Session, SessionError, SessionKey, SessionStore};

/// Result of one successful conversation turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub session_id: String,
    pub response_text: String,
    pub tool_calls: Vec<ToolCallRecord>,
    pub report: BuildReport,
}

/// Wire the advisor and its research helper to a provider.
pub fn build_advisor(settings: &Settings, provider: Arc<dyn ModelProvider>) -> LlmAgent {
    let research = LlmAgent::new(
        AgentDefinition::research(settings.research_agent_model.clone()),
        provider.clone(),
        ToolRegistry::new(),
        settings.max_tool_rounds,
    );

    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(AgentTool::new(Arc::new(research))));
    tools.register(Arc::new(CalculateBuildMetricsTool));

    LlmAgent::new(
        AgentDefinition::silicon_sage(settings.root_agent_model.clone()),
        provider,
        tools,
        settings.max_tool_rounds,
    )
}

type TurnLock = Arc<tokio::sync::Mutex<()>>;
type TurnLocks = Mutex<HashMap<SessionKey, TurnLock>>;

pub struct Runner {
    app_name: String,
    agent: Arc<LlmAgent>,
    sessions: Arc<dyn SessionStore>,
    turn_locks: TurnLocks,
}

impl Runner {
    pub fn new(
        app_name: impl Into<String>,
        agent: Arc<LlmAgent>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            agent,
            sessions,
            turn_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn session_key(&self, user_id: &str, session_id: &str) -> SessionKey {
        SessionKey::new(self.app_name.as_str(), user_id, session_id)
    }

    /// Create a session, generating an id when none is given.
    pub async fn create_session(
        &self,
        user_id: &str,
        session_id: Option<String>,
    ) -> Result<Session, AgentError> {
        let session_id = session_id.unwrap_or_else(new_session_id);
        let session = self
            .sessions
            .create(self.session_key(user_id, &session_id))
            .await?;
        info!(user_id = %user_id, session_id = %session_id, "Session created");
        Ok(session)
    }

    /// Look up the session, creating it when it does not exist yet.
    pub async fn ensure_session(
        &self,
        user_id: &str,
        session_id: Option<String>,
    ) -> Result<SessionKey, AgentError> {
        if let Some(id) = &session_id {
            let key = self.session_key(user_id, id);
            if self.sessions.get(&key).await?.is_some() {
                return Ok(key);
            }
        }

        match self.create_session(user_id, session_id).await {
            Ok(session) => Ok(session.key),
            // Lost a creation race; the session is there now.
            Err(AgentError::Session(SessionError::AlreadyExists(id))) => {
                Ok(self.session_key(user_id, &id))
            }
            Err(e) => Err(e),
        }
    }

    /// Run one turn. Turns on the same session never overlap.
    ///
    /// The turn is persisted before the final output is checked, so a
    /// contract violation still leaves the exchange in the history.
    #[instrument(skip(self, message), fields(session = %key))]
    pub async fn run(&self, key: &SessionKey, message: Content) -> Result<TurnOutcome, AgentError> {
        // Drops after `_guard`, also when this future is cancelled.
        let release = TurnLockRelease {
            locks: &self.turn_locks,
            key,
            lock: self.turn_lock(key),
        };
        let _guard = release.lock.lock().await;
        self.run_locked(key, message).await
    }

    async fn run_locked(&self, key: &SessionKey, message: Content) -> Result<TurnOutcome, AgentError> {
        let session = self
            .sessions
            .get(key)
            .await?
            .ok_or_else(|| SessionError::NotFound(key.session_id.clone()))?;

        let turn = self.agent.run_turn(&session.history, message).await?;
        self.sessions.append(key, turn.contents.clone()).await?;

        let final_text = turn.final_text().unwrap_or_default();
        let report = BuildReport::from_model_text(&final_text).map_err(|e| {
            warn!(error = %e, "Final output failed build report validation");
            AgentError::ContractViolation(e)
        })?;

        Ok(TurnOutcome {
            session_id: key.session_id.clone(),
            response_text: turn.response_text(),
            tool_calls: turn.tool_calls(),
            report,
        })
    }

    fn turn_lock(&self, key: &SessionKey) -> TurnLock {
        self.turn_locks.lock().entry(key.clone()).or_default().clone()
    }
}

/// Removes a session's lock entry on drop once no other turn holds it.
struct TurnLockRelease<'a> {
    locks: &'a TurnLocks,
    key: &'a SessionKey,
    lock: TurnLock,
}

impl Drop for TurnLockRelease<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock();
        // One reference in the map, one here.
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(self.key);
        }
    }
}
