//! Liveness probe.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Always `{"status": "OK"}`; does not touch the warehouse.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "OK" })
}
