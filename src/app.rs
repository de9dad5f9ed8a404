use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::agent::{build_advisor, ModelProvider, Runner};
use crate::config::Settings;
use crate::middleware::{request_id_layers, X_REQUEST_ID};
use crate::routes;
use crate::services::SessionStore;

/// Shared application state
pub struct AppState {
    pub settings: Settings,
    pub runner: Runner,
    pub provider: Arc<dyn ModelProvider>,
}

impl AppState {
    /// Wire the advisor to `provider` and keep its sessions in `sessions`.
    pub fn new(
        settings: Settings,
        provider: Arc<dyn ModelProvider>,
        sessions: Arc<dyn SessionStore>,
    ) -> Arc<Self> {
        let advisor = build_advisor(&settings, provider.clone());
        let runner = Runner::new(settings.app_name.clone(), Arc::new(advisor), sessions);

        Arc::new(Self {
            settings,
            runner,
            provider,
        })
    }
}

/// Build the complete application with all middleware
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.settings);
    let body_limit = RequestBodyLimitLayer::new(state.settings.request_body_limit_bytes);

    // DEBUG spans keep per-request overhead out of INFO logs
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG));

    let (set_request_id, propagate_request_id) = request_id_layers();

    Router::new()
        .merge(routes::api_router())
        // Middleware stack (applied bottom-up)
        .layer(body_limit)
        .layer(propagate_request_id)
        .layer(trace_layer)
        .layer(set_request_id)
        .layer(cors)
        .with_state(state)
}

fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors_allow_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let max_age = if settings.env.is_dev() {
        std::time::Duration::from_secs(86400)
    } else {
        std::time::Duration::from_secs(3600)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(X_REQUEST_ID),
        ]))
        .allow_credentials(true)
        .max_age(max_age)
}
