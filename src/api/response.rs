//! Standard API response types

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Response for single data item
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for DataResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Outcome of a schema validation request.
#[derive(Debug, Serialize)]
pub struct ValidationOutcome<T: Serialize> {
    pub valid: bool,
    pub value: T,
}

impl<T: Serialize> ValidationOutcome<T> {
    pub fn valid(value: T) -> Self {
        Self { valid: true, value }
    }
}
