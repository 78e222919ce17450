//! `POST /`: run a read-only query and return its rows.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::error::GatewayError;
use crate::gateway::{QueryOutcome, QueryRequest};
use crate::state::AppState;

pub async fn query(
    State(state): State<Arc<AppState>>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryOutcome>, GatewayError> {
    let Json(req) = body.map_err(|rejection| GatewayError::InvalidRequest(rejection.body_text()))?;
    let outcome = state.gateway.execute(&req.query).await?;
    Ok(Json(outcome))
}
