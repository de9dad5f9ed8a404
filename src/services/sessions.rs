//! Conversation session storage.
//!
//! The store is injected into the runner so a persistent backend can replace
//! the in-memory one without touching callers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::agent::Content;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.app_name, self.user_id, self.session_id)
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub key: SessionKey,
    pub history: Vec<Content>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    fn new(key: SessionKey) -> Self {
        let now = Utc::now();
        Self {
            key,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session already exists: {0}")]
    AlreadyExists(String),

    #[error("Session not found: {0}")]
    NotFound(String),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create an empty session. Fails if the key is taken.
    async fn create(&self, key: SessionKey) -> Result<Session, SessionError>;

    async fn get(&self, key: &SessionKey) -> Result<Option<Session>, SessionError>;

    /// Append contents to an existing session's history.
    async fn append(&self, key: &SessionKey, contents: Vec<Content>) -> Result<(), SessionError>;
}

/// Process-lifetime store. Nothing survives a restart.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionKey, Session>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, key: SessionKey) -> Result<Session, SessionError> {
        let mut sessions = self.sessions.write();
        if sessions.contains_key(&key) {
            return Err(SessionError::AlreadyExists(key.session_id));
        }
        let session = Session::new(key.clone());
        sessions.insert(key, session.clone());
        tracing::debug!(session = %session.key, "Session created");
        Ok(session)
    }

    async fn get(&self, key: &SessionKey) -> Result<Option<Session>, SessionError> {
        Ok(self.sessions.read().get(key).cloned())
    }

    async fn append(&self, key: &SessionKey, contents: Vec<Content>) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(key)
            .ok_or_else(|| SessionError::NotFound(key.session_id.clone()))?;
        session.history.extend(contents);
        session.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(session_id: &str) -> SessionKey {
        SessionKey::new("agents", "u-1", session_id)
    }

    #[tokio::test]
    async fn create_then_get() {
        let store = InMemorySessionStore::new();
        let created = store.create(key("s_1")).await.unwrap();
        assert!(created.history.is_empty());

        let fetched = store.get(&key("s_1")).await.unwrap().unwrap();
        assert_eq!(fetched.key, key("s_1"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() {
        let store = InMemorySessionStore::new();
        store.create(key("s_1")).await.unwrap();
        let err = store.create(key("s_1")).await.unwrap_err();
        assert_eq!(err, SessionError::AlreadyExists("s_1".into()));
    }

    #[tokio::test]
    async fn sessions_are_scoped_by_user() {
        let store = InMemorySessionStore::new();
        store.create(key("s_1")).await.unwrap();
        let other_user = SessionKey::new("agents", "u-2", "s_1");
        assert!(store.get(&other_user).await.unwrap().is_none());
        store.create(other_user).await.unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn append_extends_history() {
        let store = InMemorySessionStore::new();
        let created = store.create(key("s_1")).await.unwrap();
        store
            .append(&key("s_1"), vec![Content::user_text("hello")])
            .await
            .unwrap();

        let session = store.get(&key("s_1")).await.unwrap().unwrap();
        assert_eq!(session.history.len(), 1);
        assert!(session.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn append_to_unknown_session_fails() {
        let store = InMemorySessionStore::new();
        let err = store
            .append(&key("missing"), vec![Content::user_text("hello")])
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::NotFound("missing".into()));
    }
}
