use anyhow::{Context, Result};
use std::env;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,
    pub app_name: String,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // Model provider
    pub model_api_url: Url,
    pub model_api_key: String,
    pub root_agent_model: String,
    pub research_agent_model: String,
    pub model_timeout_seconds: u64,
    pub model_retry_max_elapsed_seconds: u64,

    // Orchestration
    pub max_tool_rounds: usize,

    // HTTP
    pub request_body_limit_bytes: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup (the process environment in
    /// production, a plain map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let env = Environment::from_str(&var_or("ENV", "dev"));
        let server_addr = var_or("SERVER_ADDR", "0.0.0.0:8000");
        let app_name = var_or("APP_NAME", "agents");

        // CORS
        let cors_allow_origins = var_or(
            "CORS_ALLOW_ORIGINS",
            "http://localhost:3000,http://127.0.0.1:3000",
        )
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

        // Model provider
        let model_api_url = var_or("MODEL_API_URL", "https://generativelanguage.googleapis.com");
        let model_api_url = Url::parse(&model_api_url)
            .with_context(|| format!("MODEL_API_URL is not a valid URL: {model_api_url}"))?;
        let model_api_key = lookup("GOOGLE_API_KEY").context("GOOGLE_API_KEY must be set")?;
        let root_agent_model = var_or("ROOT_AGENT_MODEL", "gemini-2.5-pro");
        let research_agent_model = var_or("RESEARCH_AGENT_MODEL", "gemini-2.5-flash");
        let model_timeout_seconds = lookup("MODEL_TIMEOUT_SECONDS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(120); // 2 minutes default for LLM calls
        let model_retry_max_elapsed_seconds = lookup("MODEL_RETRY_MAX_ELAPSED_SECONDS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);

        let max_tool_rounds = lookup("MAX_TOOL_ROUNDS")
            .and_then(|s| s.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(16);

        let request_body_limit_bytes = lookup("REQUEST_BODY_LIMIT_BYTES")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1024 * 1024);

        Ok(Settings {
            env,
            server_addr,
            app_name,
            cors_allow_origins,
            model_api_url,
            model_api_key,
            root_agent_model,
            research_agent_model,
            model_timeout_seconds,
            model_retry_max_elapsed_seconds,
            max_tool_rounds,
            request_body_limit_bytes,
        })
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_seconds)
    }

    pub fn model_retry_max_elapsed(&self) -> Duration {
        Duration::from_secs(self.model_retry_max_elapsed_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_the_key_is_set() {
        let settings = settings_from(&[("GOOGLE_API_KEY", "k")]).unwrap();
        assert_eq!(settings.env, Environment::Dev);
        assert_eq!(settings.server_addr, "0.0.0.0:8000");
        assert_eq!(settings.app_name, "agents");
        assert_eq!(
            settings.cors_allow_origins,
            vec!["http://localhost:3000", "http://127.0.0.1:3000"]
        );
        assert_eq!(settings.root_agent_model, "gemini-2.5-pro");
        assert_eq!(settings.research_agent_model, "gemini-2.5-flash");
        assert_eq!(settings.model_timeout(), Duration::from_secs(120));
        assert_eq!(settings.max_tool_rounds, 16);
        assert_eq!(settings.request_body_limit_bytes, 1024 * 1024);
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let err = settings_from(&[]).unwrap_err();
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn malformed_numbers_fall_back_to_defaults() {
        let settings = settings_from(&[
            ("GOOGLE_API_KEY", "k"),
            ("MODEL_TIMEOUT_SECONDS", "soon"),
            ("MAX_TOOL_ROUNDS", "0"),
        ])
        .unwrap();
        assert_eq!(settings.model_timeout_seconds, 120);
        assert_eq!(settings.max_tool_rounds, 16);
    }

    #[test]
    fn invalid_model_url_is_rejected() {
        let err = settings_from(&[("GOOGLE_API_KEY", "k"), ("MODEL_API_URL", "not a url")])
            .unwrap_err();
        assert!(err.to_string().contains("MODEL_API_URL"));
    }

    #[test]
    fn environment_parsing() {
        assert!(Environment::from_str("Production").is_prod());
        assert_eq!(Environment::from_str("staging"), Environment::Staging);
        assert!(Environment::from_str("anything").is_dev());
    }
}
