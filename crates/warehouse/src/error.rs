use serde::Deserialize;

/// One entry of the `error.errors` list in a BigQuery error payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// Errors that can occur while talking to the warehouse.
#[derive(Debug, thiserror::Error)]
pub enum WarehouseError {
    /// No usable credentials: no static token and the metadata server did not answer.
    #[error("no credentials available: {0}")]
    Credentials(String),

    /// The engine rejected the request (bad SQL, permission denied, quota, job failure).
    #[error("{status} {method} {url}: {message}")]
    Api {
        status: u16,
        method: &'static str,
        url: String,
        message: String,
        errors: Vec<ApiErrorDetail>,
    },

    /// The HTTP exchange itself failed (DNS, connect, TLS, timeout on a single call).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The job did not complete within the configured wait limit.
    #[error("job {job_id} did not complete within {seconds}s")]
    JobTimeout { job_id: String, seconds: u32 },

    /// The engine answered with a payload we could not interpret.
    #[error("failed to decode warehouse response: {0}")]
    Decode(String),
}

impl WarehouseError {
    /// Messages of the engine's error entries, in the order reported.
    ///
    /// Empty for errors that did not originate from an engine response.
    pub fn messages(&self) -> Vec<&str> {
        match self {
            WarehouseError::Api { errors, .. } => errors.iter().map(|e| e.message.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    /// `true` when the failure was reported by (or while reaching) the engine,
    /// as opposed to a local decoding problem.
    pub fn is_engine_error(&self) -> bool {
        !matches!(self, WarehouseError::Decode(_))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

/// Build an [`WarehouseError::Api`] from a non-success response body.
///
/// Falls back to the raw body text when it is not a BigQuery error envelope.
pub(crate) fn api_error(status: u16, method: &'static str, url: &str, body: &str) -> WarehouseError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => WarehouseError::Api {
            status,
            method,
            url: url.to_string(),
            message: env.error.message,
            errors: env.error.errors,
        },
        Err(_) => WarehouseError::Api {
            status,
            method,
            url: url.to_string(),
            message: body.trim().to_string(),
            errors: Vec::new(),
        },
    }
}
