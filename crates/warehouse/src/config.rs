use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Placeholder project ID used when `GCP_PROJECT_ID` is not set.
pub const DEFAULT_PROJECT_ID: &str = "your-gcp-project-id";

const DEFAULT_DATASET_ID: &str = "your_dataset_id";
const DEFAULT_TABLE_ID: &str = "your_table_id";

/// Public BigQuery REST root.
pub const DEFAULT_API_BASE_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

const DEFAULT_PAGE_SIZE: u32 = 10_000;

/// Upper bound on the server-side wait of a single query call.
const MAX_SERVER_WAIT_MS: u32 = 10_000;

// ── Env helpers ──────────────────────────────────────────────────
//
// Shared with the server crate so every setting resolves profiles the same way.

/// Read an env var, treating an empty value as unset.
pub fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries `{PROFILE}_{KEY}` first, falls back to `{KEY}`.
pub fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

pub fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

/// Parse a profiled env var, falling back to `default` when unset or unparseable.
pub fn profiled_env_parse<T: FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── WarehouseConfig ──────────────────────────────────────────────

/// Connection settings for the BigQuery warehouse.
///
/// Reads from environment variables with optional profile prefix.
/// With profile `PROD`, checks `PROD_GCP_PROJECT_ID` before `GCP_PROJECT_ID`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Project the query jobs run in (and are billed to).
    pub project_id: String,
    /// Default dataset. Informational only; queries are never rewritten.
    pub dataset_id: String,
    /// Default table. Informational only.
    pub table_id: String,
    /// Job location (`US`, `EU`, a region). `None` lets BigQuery decide.
    pub location: Option<String>,
    /// REST root, without trailing slash.
    pub api_base_url: String,
    /// Static OAuth bearer token. When unset the metadata server is asked.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// Host of the GCE / Cloud Run metadata server.
    pub metadata_host: String,
    /// Maximum time to wait for a job to finish (0 = wait indefinitely).
    pub job_timeout_seconds: u32,
    /// Timeout applied to every individual HTTP call.
    pub request_timeout_seconds: u32,
    /// Rows requested per result page.
    pub page_size: u32,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            project_id: DEFAULT_PROJECT_ID.to_string(),
            dataset_id: DEFAULT_DATASET_ID.to_string(),
            table_id: DEFAULT_TABLE_ID.to_string(),
            location: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            access_token: None,
            metadata_host: DEFAULT_METADATA_HOST.to_string(),
            job_timeout_seconds: 0,
            request_timeout_seconds: 60,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl WarehouseConfig {
    /// Build config for a specific named profile.
    pub fn from_env_profiled(profile: &str) -> Self {
        let defaults = Self::default();

        Self {
            project_id: profiled_env_or(profile, "GCP_PROJECT_ID", DEFAULT_PROJECT_ID),
            dataset_id: profiled_env_or(profile, "BQ_DATASET_ID", DEFAULT_DATASET_ID),
            table_id: profiled_env_or(profile, "BQ_TABLE_ID", DEFAULT_TABLE_ID),
            location: profiled_env_opt(profile, "BQ_LOCATION"),
            api_base_url: profiled_env_or(profile, "BQ_API_BASE_URL", DEFAULT_API_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            access_token: profiled_env_opt(profile, "BQ_ACCESS_TOKEN"),
            metadata_host: profiled_env_or(profile, "GCE_METADATA_HOST", DEFAULT_METADATA_HOST),
            job_timeout_seconds: profiled_env_parse(
                profile,
                "BQ_JOB_TIMEOUT_SECONDS",
                defaults.job_timeout_seconds,
            ),
            request_timeout_seconds: profiled_env_parse(
                profile,
                "BQ_REQUEST_TIMEOUT_SECONDS",
                defaults.request_timeout_seconds,
            ),
            page_size: profiled_env_parse(profile, "BQ_PAGE_SIZE", DEFAULT_PAGE_SIZE).max(1),
        }
    }

    /// Fully qualified default table, e.g. `my-project.sales.orders`.
    pub fn default_table(&self) -> String {
        format!("{}.{}.{}", self.project_id, self.dataset_id, self.table_id)
    }

    /// How long BigQuery may hold a `jobs.query` / `getQueryResults` call open.
    ///
    /// Capped at 10s and kept one second under the per-request timeout, so a
    /// long-polled call returns `jobComplete: false` before the HTTP call times out.
    pub fn server_wait_ms(&self) -> u32 {
        let request_ms = self.request_timeout_seconds.max(1).saturating_mul(1000);
        MAX_SERVER_WAIT_MS.min(request_ms.saturating_sub(1000))
    }
}

// ── Tests ────────────────────────────────────────────────────────
