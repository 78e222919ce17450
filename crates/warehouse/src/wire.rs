//! Payload shapes of the BigQuery v2 REST API (`jobs.query`, `jobs.getQueryResults`).
//!
//! Only the fields the client reads are modelled; everything else is ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::result::Column;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryRequest<'a> {
    pub query: &'a str,
    pub use_legacy_sql: bool,
    pub max_results: u32,
    pub timeout_ms: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<&'a str>,
    pub format_options: FormatOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FormatOptions {
    pub use_int64_timestamp: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobReference {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub job_id: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// Response of both `jobs.query` and `jobs.getQueryResults`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryResponse {
    #[serde(default)]
    pub job_complete: bool,
    #[serde(default)]
    pub job_reference: Option<JobReference>,
    #[serde(default)]
    pub schema: Option<TableSchema>,
    #[serde(default)]
    pub rows: Vec<TableRow>,
    #[serde(default)]
    pub page_token: Option<String>,
    /// int64 values are JSON strings on the wire.
    #[serde(default)]
    pub total_rows: Option<String>,
    #[serde(default)]
    pub total_bytes_processed: Option<String>,
    #[serde(default)]
    pub cache_hit: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct TableSchema {
    #[serde(default)]
    pub fields: Vec<TableFieldSchema>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TableFieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub fields: Vec<TableFieldSchema>,
}

impl From<&TableFieldSchema> for Column {
    fn from(field: &TableFieldSchema) -> Self {
        Column {
            name: field.name.clone(),
            data_type: field.field_type.to_uppercase(),
            mode: field
                .mode
                .as_deref()
                .unwrap_or("NULLABLE")
                .to_uppercase(),
            fields: field.fields.iter().map(Column::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TableRow {
    #[serde(default)]
    pub f: Vec<TableCell>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TableCell {
    #[serde(default)]
    pub v: Value,
}

/// Token payload of the metadata server.
#[derive(Debug, Deserialize)]
pub(crate) struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: u64,
}
