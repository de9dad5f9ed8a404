use anyhow::Result;
use std::sync::Arc;

use silicon_sage::agent::ModelProvider;
use silicon_sage::services::{GeminiClient, InMemorySessionStore};
use silicon_sage::{app, config, logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let settings = config::Settings::from_env()?;

    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        app_name = %settings.app_name,
        root_model = %settings.root_agent_model,
        "Starting Silicon Sage"
    );

    let provider = Arc::new(GeminiClient::new(&settings)?);

    // Probe the provider without blocking startup
    tokio::spawn({
        let provider = provider.clone();
        async move {
            match provider.health_check().await {
                Ok(()) => tracing::info!("Model provider is reachable"),
                Err(e) => tracing::warn!(error = %e, "Model provider health check failed"),
            }
        }
    });

    let sessions = Arc::new(InMemorySessionStore::new());
    let state = app::AppState::new(settings.clone(), provider, sessions);
    let app = app::create_app(state);

    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
