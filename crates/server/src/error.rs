//! Gateway errors and their HTTP responses.
//!
//! Every failure becomes a JSON body of the form `{"detail": "..."}`. Guard
//! rejections are not errors; see [`crate::gateway::QueryOutcome`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use querygate_warehouse::WarehouseError;
use serde::Serialize;
use thiserror::Error;

pub const UNINITIALIZED_DETAIL: &str =
    "Error: BigQuery client not initialized. Check service account permissions or configuration.";

#[derive(Error, Debug)]
pub enum GatewayError {
    /// The warehouse client could not be built at startup.
    #[error("warehouse client not initialized")]
    Uninitialized,

    /// The engine rejected or failed the query.
    #[error("execution error: {0}")]
    Execution(WarehouseError),

    /// Anything else that went wrong while producing the result.
    #[error("internal error: {0}")]
    Internal(String),

    /// The request body was not a valid query request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing summary of the error.
    pub fn detail(&self) -> String {
        match self {
            GatewayError::Uninitialized => UNINITIALIZED_DETAIL.to_string(),
            GatewayError::Execution(err) => match err.messages().first() {
                Some(first) => format!("BigQuery Error: BigQuery API Error: {first}"),
                None => format!("BigQuery Error: {err}"),
            },
            GatewayError::Internal(msg) => format!("Internal server error: {msg}"),
            GatewayError::InvalidRequest(msg) => msg.clone(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            detail: self.detail(),
        };
        (self.status(), Json(body)).into_response()
    }
}
