//! Deterministic endpoints that need no model: the metrics calculator and
//! schema validation.

use axum::{extract::rejection::JsonRejection, Json};
use serde_json::Value;

use crate::api::{DataResponse, ValidationOutcome};
use crate::domain::build_report::{validate_build_report, BuildReport};
use crate::domain::build_request::{validate_build_request, BuildRequest};
use crate::domain::metrics::{compute_metrics, parse_components, MetricsReport};
use crate::error::ApiResult;

/// POST /tools/calculate-build-metrics
pub async fn calculate_build_metrics(
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<DataResponse<MetricsReport>> {
    let Json(payload) = body?;
    let components = parse_components(&payload)?;
    Ok(DataResponse::new(compute_metrics(&components)))
}

/// POST /schemas/build-request/validate
pub async fn validate_request(
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<DataResponse<ValidationOutcome<BuildRequest>>> {
    let Json(payload) = body?;
    let request = validate_build_request(&payload)?;
    Ok(DataResponse::new(ValidationOutcome::valid(request)))
}

/// POST /schemas/build-report/validate
pub async fn validate_report(
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<DataResponse<ValidationOutcome<BuildReport>>> {
    let Json(payload) = body?;
    let report = validate_build_report(&payload)?;
    Ok(DataResponse::new(ValidationOutcome::valid(report)))
}
