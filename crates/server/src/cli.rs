//! Command-line arguments. Every flag falls back to its environment variable.

use clap::Parser;

use crate::config::Config;

/// querygate: HTTP gateway for read-only BigQuery queries.
#[derive(Parser, Debug)]
#[command(name = "querygate", version, about)]
pub struct Cli {
    /// Configuration profile; `{PROFILE}_{KEY}` env vars override `{KEY}`.
    #[arg(long, env = "QUERYGATE_PROFILE")]
    pub profile: Option<String>,

    /// Interface to bind (overrides HOST).
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides PORT).
    #[arg(long)]
    pub port: Option<u16>,
}

impl Cli {
    /// Resolve the effective configuration: env (with profile), then flags.
    pub fn into_config(self) -> Config {
        let mut config = Config::for_profile(self.profile.as_deref().unwrap_or_default());
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        config
    }
}
