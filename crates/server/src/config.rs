use querygate_warehouse::config::{profiled_env_or, profiled_env_parse};
use querygate_warehouse::WarehouseConfig;
use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub warehouse: WarehouseConfig,
}

impl Config {
    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        Self {
            server: ServerConfig::from_env_profiled(&p),
            warehouse: WarehouseConfig::from_env_profiled(&p),
            profile: p,
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:     {}", self.server.bind_addr());
        tracing::info!(
            "  warehouse:  project={}, default_table={}, location={}",
            self.warehouse.project_id,
            self.warehouse.default_table(),
            self.warehouse.location.as_deref().unwrap_or("(auto)")
        );
        tracing::info!(
            "  auth:       {}",
            if self.warehouse.access_token.is_some() { "static token" } else { "metadata server" }
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env_profiled(profile: &str) -> Self {
        Self {
            host: profiled_env_or(profile, "HOST", "0.0.0.0"),
            port: profiled_env_parse(profile, "PORT", 8080),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
