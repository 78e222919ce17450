//! Query execution: read-only guard, delegation to the warehouse, outcome mapping.
//!
//! The guard is a plain prefix check on the trimmed, upper-cased text. It is
//! not a SQL parser and not a security boundary: comments, multi-statement
//! scripts and similar tricks are not detected. Access control belongs to the
//! warehouse credentials.

use std::sync::Arc;

use querygate_warehouse::{BigQueryClient, Row, Warehouse, WarehouseConfig};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::GatewayError;

pub const READ_ONLY_MESSAGE: &str = "Only SELECT queries are allowed for data retrieval.";

/// Body of `POST /`.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

/// Returned with status 200 when the guard rejects a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardRejection {
    pub error: String,
}

impl Default for GuardRejection {
    fn default() -> Self {
        Self {
            error: READ_ONLY_MESSAGE.to_string(),
        }
    }
}

/// Successful outcome of a query request.
///
/// Serializes as a bare JSON array of rows, or as `{"error": "..."}` for a guard rejection.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    Rows(Vec<Row>),
    Rejected(GuardRejection),
}

/// `true` if `query` starts with `SELECT` once trimmed, ignoring case.
pub fn is_read_only(query: &str) -> bool {
    query.trim().to_uppercase().starts_with("SELECT")
}

/// The warehouse client as built at startup: ready, or the reason it is not.
#[derive(Clone)]
pub enum WarehouseHandle {
    Ready(Arc<dyn Warehouse>),
    Unavailable { reason: Arc<str> },
}

impl WarehouseHandle {
    /// Build the BigQuery client, recording instead of propagating a failure
    /// so the service still starts (health probes, local runs without credentials).
    pub async fn connect(config: WarehouseConfig) -> Self {
        let project = config.project_id.clone();
        match BigQueryClient::connect(config).await {
            Ok(client) => {
                info!("BigQuery Client initialized for Project: {}", project);
                Self::ready(client)
            }
            Err(e) => {
                error!("Failed to initialize BigQuery Client: {}", e);
                Self::unavailable(e.to_string())
            }
        }
    }

    pub fn ready(warehouse: impl Warehouse + 'static) -> Self {
        WarehouseHandle::Ready(Arc::new(warehouse))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        WarehouseHandle::Unavailable {
            reason: Arc::from(reason.into()),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, WarehouseHandle::Ready(_))
    }
}

/// Runs read-only queries against the configured warehouse.
#[derive(Clone)]
pub struct QueryGateway {
    warehouse: WarehouseHandle,
}

impl QueryGateway {
    pub fn new(warehouse: WarehouseHandle) -> Self {
        Self { warehouse }
    }

    /// Execute `query` and collect its rows.
    ///
    /// Order of checks: client availability, then the read-only guard, then
    /// execution. A guard rejection is an `Ok` outcome; the engine is not called.
    pub async fn execute(&self, query: &str) -> Result<QueryOutcome, GatewayError> {
        let warehouse = match &self.warehouse {
            WarehouseHandle::Ready(w) => w,
            WarehouseHandle::Unavailable { reason } => {
                warn!(reason = %reason, "Query refused: warehouse client not initialized");
                return Err(GatewayError::Uninitialized);
            }
        };

        info!(query = %query, "Executing Query");

        if !is_read_only(query) {
            info!("Query rejected by read-only guard");
            return Ok(QueryOutcome::Rejected(GuardRejection::default()));
        }

        match warehouse.query(query).await {
            Ok(result) => {
                let meta = &result.metadata;
                info!(
                    job_id = %meta.job_id,
                    location = meta.location.as_deref().unwrap_or("-"),
                    columns = result.columns.len(),
                    pages = meta.pages,
                    bytes_processed = meta.bytes_processed,
                    cache_hit = meta.cache_hit,
                    "Query successful. Returned {} rows.",
                    result.row_count()
                );
                Ok(QueryOutcome::Rows(result.into_rows()))
            }
            Err(e) if e.is_engine_error() => {
                error!(error = %e, messages = ?e.messages(), "BQ Execution Error");
                Err(GatewayError::Execution(e))
            }
            Err(e) => {
                error!(error = %e, "General Error during query");
                Err(GatewayError::Internal(e.to_string()))
            }
        }
    }
}
