//! Silicon Sage: a PC build advisor service.
//!
//! Deterministic core (build metrics, request/report schema validation) behind
//! an agent orchestration layer and an axum HTTP facade.

pub mod agent;
pub mod api;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod validation;
