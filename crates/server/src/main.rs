use clap::Parser;

use querygate_server::cli::Cli;
use querygate_server::config::load_dotenv;
use querygate_server::startup;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_config();
    config.log_summary();

    startup::serve(&config).await
}
