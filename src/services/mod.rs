//! Service layer: the model provider client and session storage.

pub mod model_client;
pub mod sessions;

pub use model_client::GeminiClient;
pub use sessions::{InMemorySessionStore, Session, SessionError, SessionKey, SessionStore};
