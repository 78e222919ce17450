//! BigQuery query execution client.
//!
//! Provides [`BigQueryClient`] for executing SQL against BigQuery over its
//! REST API: submit with `jobs.query`, poll `jobs.getQueryResults` with
//! exponential backoff until the job completes, then page through all rows
//! and decode them into a [`QueryResult`].

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::auth::TokenSource;
use crate::config::WarehouseConfig;
use crate::convert::decode_row;
use crate::error::{api_error, WarehouseError};
use crate::result::{Column, JobMetadata, QueryResult};
use crate::wire::{FormatOptions, JobReference, QueryRequest, QueryResponse};

// ---------------------------------------------------------------------------
// Warehouse trait
// ---------------------------------------------------------------------------

/// A remote engine that runs a SQL query to completion and returns its rows.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Submit `sql` unmodified and wait for the result.
    async fn query(&self, sql: &str) -> Result<QueryResult, WarehouseError>;
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for executing queries against BigQuery.
///
/// Holds only configuration, a pooled HTTP client and the token source, so a
/// single instance is shared by all requests.
pub struct BigQueryClient {
    config: WarehouseConfig,
    http: reqwest::Client,
    tokens: TokenSource,
}

impl BigQueryClient {
    /// Create a client for `config.project_id`.
    ///
    /// Fails with [`WarehouseError::Credentials`] when no access token can be obtained.
    pub async fn connect(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if config.project_id.trim().is_empty() {
            return Err(WarehouseError::Credentials("project id is empty".into()));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.request_timeout_seconds.max(1) as u64))
            .build()?;

        let tokens = TokenSource::resolve(&config, &http).await?;

        info!(
            project = %config.project_id,
            location = config.location.as_deref().unwrap_or("(auto)"),
            "BigQueryClient initialised"
        );

        Ok(Self {
            config,
            http,
            tokens,
        })
    }

    // -----------------------------------------------------------------------
    // Public API
    // -----------------------------------------------------------------------

    /// Execute a SQL query and return every row of the result.
    ///
    /// This performs the full lifecycle:
    /// 1. Submit the query (`jobs.query`)
    /// 2. Poll until the job completes (with exponential backoff)
    /// 3. Fetch remaining result pages and decode rows
    pub async fn execute_query(&self, sql: &str) -> Result<QueryResult, WarehouseError> {
        debug!(sql = %sql, "Submitting BigQuery query");

        let first = self.start_query(sql).await?;
        let job = first.job_reference.clone().unwrap_or_default();

        let mut page = if first.job_complete {
            first
        } else {
            info!(job_id = %job.job_id, "Query job running, waiting for completion");
            self.poll_until_complete(&job).await?
        };

        let columns: Vec<Column> = page
            .schema
            .as_ref()
            .map(|s| s.fields.iter().map(Column::from).collect())
            .unwrap_or_default();

        let mut metadata = JobMetadata {
            job_id: job.job_id.clone(),
            location: job.location.clone(),
            total_rows: parse_count(page.total_rows.as_deref()),
            bytes_processed: parse_count(page.total_bytes_processed.as_deref()),
            cache_hit: page.cache_hit.unwrap_or(false),
            pages: 0,
        };

        let mut rows = Vec::with_capacity(metadata.total_rows.min(100_000) as usize);
        loop {
            metadata.pages += 1;
            for raw in &page.rows {
                rows.push(decode_row(&columns, raw)?);
            }

            let Some(token) = page.page_token.take() else {
                break;
            };
            if job.job_id.is_empty() {
                return Err(WarehouseError::Decode(
                    "result has more pages but no job reference".into(),
                ));
            }
            page = self.get_query_results(&job, Some(&token)).await?;
        }

        debug!(
            job_id = %metadata.job_id,
            columns = columns.len(),
            rows = rows.len(),
            pages = metadata.pages,
            "Fetched BigQuery results"
        );

        Ok(QueryResult {
            columns,
            rows,
            metadata,
        })
    }

    /// Request cancellation of a running job.
    pub async fn cancel_job(&self, job_id: &str, location: Option<&str>) -> Result<(), WarehouseError> {
        info!(job_id = %job_id, "Cancelling job");

        let url = format!(
            "{}/projects/{}/jobs/{}/cancel",
            self.config.api_base_url, self.config.project_id, job_id
        );
        let mut request = self.http.post(&url);
        if let Some(location) = location {
            request = request.query(&[("location", location)]);
        }
        let _: serde_json::Value = self.send(request, "POST", &url).await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    async fn start_query(&self, sql: &str) -> Result<QueryResponse, WarehouseError> {
        let url = format!(
            "{}/projects/{}/queries",
            self.config.api_base_url, self.config.project_id
        );
        let body = QueryRequest {
            query: sql,
            use_legacy_sql: false,
            max_results: self.config.page_size,
            timeout_ms: self.config.server_wait_ms(),
            location: self.config.location.as_deref(),
            format_options: FormatOptions {
                use_int64_timestamp: true,
            },
        };

        self.send(self.http.post(&url).json(&body), "POST", &url).await
    }

    async fn get_query_results(
        &self,
        job: &JobReference,
        page_token: Option<&str>,
    ) -> Result<QueryResponse, WarehouseError> {
        let project = if job.project_id.is_empty() {
            &self.config.project_id
        } else {
            &job.project_id
        };
        let url = format!(
            "{}/projects/{}/queries/{}",
            self.config.api_base_url, project, job.job_id
        );

        let mut params: Vec<(&str, String)> = vec![
            ("maxResults", self.config.page_size.to_string()),
            ("timeoutMs", self.config.server_wait_ms().to_string()),
            ("formatOptions.useInt64Timestamp", "true".to_string()),
        ];
        if let Some(location) = &job.location {
            params.push(("location", location.clone()));
        }
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        self.send(self.http.get(&url).query(&params), "GET", &url).await
    }

    /// Poll `jobs.getQueryResults` with exponential backoff until the job
    /// completes or the configured wait limit is exceeded.
    async fn poll_until_complete(&self, job: &JobReference) -> Result<QueryResponse, WarehouseError> {
        if job.job_id.is_empty() {
            return Err(WarehouseError::Decode(
                "incomplete job without a job reference".into(),
            ));
        }

        let start = Instant::now();
        let limit = self.config.job_timeout_seconds;

        let initial_delay_ms: u64 = 200;
        let max_delay_ms: u64 = 2000;
        let backoff_factor: f64 = 1.5;

        let mut delay_ms = initial_delay_ms;

        loop {
            let resp = self.get_query_results(job, None).await?;

            debug!(
                job_id = %job.job_id,
                complete = resp.job_complete,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Polling job status"
            );

            if resp.job_complete {
                return Ok(resp);
            }

            if limit > 0 && start.elapsed() > Duration::from_secs(limit as u64) {
                warn!(
                    job_id = %job.job_id,
                    timeout_seconds = limit,
                    "Job timed out, cancelling"
                );
                // Best-effort cancel; the timeout is what gets reported.
                if let Err(e) = self.cancel_job(&job.job_id, job.location.as_deref()).await {
                    error!(job_id = %job.job_id, error = %e, "Cancel request failed");
                }
                return Err(WarehouseError::JobTimeout {
                    job_id: job.job_id.clone(),
                    seconds: limit,
                });
            }

            // Jitter without rand: nanosecond fraction of the current time.
            let jitter_ms = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .subsec_nanos()
                % 100;

            tokio::time::sleep(Duration::from_millis(delay_ms + jitter_ms as u64)).await;

            delay_ms = ((delay_ms as f64 * backoff_factor) as u64).min(max_delay_ms);
        }
    }

    /// Attach auth, send, and decode a JSON response or the engine's error payload.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        method: &'static str,
        url: &str,
    ) -> Result<T, WarehouseError> {
        let token = self.tokens.token(&self.http).await?;
        let response = request.bearer_auth(token).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = api_error(status.as_u16(), method, url, &body);
            error!(status = status.as_u16(), error = %err, "BigQuery request failed");
            return Err(err);
        }

        serde_json::from_str(&body)
            .map_err(|e| WarehouseError::Decode(format!("{method} {url}: {e}")))
    }
}

#[async_trait]
impl Warehouse for BigQueryClient {
    async fn query(&self, sql: &str) -> Result<QueryResult, WarehouseError> {
        self.execute_query(sql).await
    }
}

fn parse_count(value: Option<&str>) -> u64 {
    value.and_then(|v| v.parse().ok()).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
