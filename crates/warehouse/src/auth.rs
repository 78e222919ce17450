//! OAuth access tokens for the BigQuery REST API.

use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::WarehouseConfig;
use crate::error::WarehouseError;
use crate::wire::AccessToken;

/// Tokens are refreshed this long before the metadata server says they expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// How long construction waits for the metadata server before giving up.
const FIRST_TOKEN_TIMEOUT: Duration = Duration::from_secs(3);

pub(crate) struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Where bearer tokens come from.
pub(crate) enum TokenSource {
    /// A token supplied through configuration, used as-is.
    Static(String),
    /// The GCE / Cloud Run metadata server of the attached service account.
    Metadata {
        url: String,
        cache: RwLock<Option<CachedToken>>,
    },
}

impl TokenSource {
    /// Pick a token source for `config` and make sure it can produce a token.
    ///
    /// The first metadata request is bounded by a short timeout so construction never hangs.
    pub(crate) async fn resolve(
        config: &WarehouseConfig,
        http: &reqwest::Client,
    ) -> Result<Self, WarehouseError> {
        if let Some(token) = &config.access_token {
            info!("Using static access token from configuration");
            return Ok(TokenSource::Static(token.clone()));
        }

        let url = format!(
            "http://{}/computeMetadata/v1/instance/service-accounts/default/token",
            config.metadata_host
        );
        let token = fetch_metadata_token(http, &url, Some(FIRST_TOKEN_TIMEOUT))
            .await
            .map_err(|e| WarehouseError::Credentials(format!("metadata server at {url}: {e}")))?;

        info!(host = %config.metadata_host, "Using metadata server credentials");
        Ok(TokenSource::Metadata {
            url,
            cache: RwLock::new(Some(token)),
        })
    }

    /// Current bearer token, refreshing from the metadata server when due.
    pub(crate) async fn token(&self, http: &reqwest::Client) -> Result<String, WarehouseError> {
        let (url, cache) = match self {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::Metadata { url, cache } => (url, cache),
        };

        if let Some(cached) = cache.read().await.as_ref() {
            if Instant::now() < cached.refresh_at {
                return Ok(cached.value.clone());
            }
        }

        let mut guard = cache.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(cached) = guard.as_ref() {
            if Instant::now() < cached.refresh_at {
                return Ok(cached.value.clone());
            }
        }

        debug!("Refreshing access token");
        let fresh = fetch_metadata_token(http, url, None).await?;
        let value = fresh.value.clone();
        *guard = Some(fresh);
        Ok(value)
    }
}

async fn fetch_metadata_token(
    http: &reqwest::Client,
    url: &str,
    timeout: Option<Duration>,
) -> Result<CachedToken, WarehouseError> {
    let mut request = http.get(url).header("Metadata-Flavor", "Google");
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(WarehouseError::Credentials(format!(
            "token request returned {}: {}",
            status.as_u16(),
            body.trim()
        )));
    }

    let token: AccessToken = response
        .json()
        .await
        .map_err(|e| WarehouseError::Credentials(format!("unreadable token response: {e}")))?;

    let lifetime = Duration::from_secs(token.expires_in);
    Ok(CachedToken {
        value: token.access_token,
        refresh_at: Instant::now() + lifetime.saturating_sub(REFRESH_MARGIN),
    })
}
