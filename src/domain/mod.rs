//! Domain types: build request/report contracts, the metrics calculator and
//! the chat DTOs.

pub mod build_report;
pub mod build_request;
pub mod chat;
pub mod metrics;

pub use build_report::{validate_build_report, BuildReport};
pub use build_request::{validate_build_request, BuildRequest};
pub use metrics::{compute_metrics, parse_components, ComponentMetricsInput, MetricsReport};
