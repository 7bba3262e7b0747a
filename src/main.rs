//! Mapspeak server binary
//!
//! Loads configuration from the environment, connects to PostGIS,
//! builds the configured text-generation backend, and serves the API.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mapspeak_api::{ApiConfig, ApiServer};
use mapspeak_core::config::AppConfig;
use mapspeak_core::llm::{create_generator, TextGenerator};
use mapspeak_databases::PostgisStore;

/// Natural-language front end for a web map
#[derive(Debug, Parser)]
#[command(name = "mapspeak", version)]
struct Args {
    /// Bind host, overrides MAPSPEAK_HOST
    #[arg(long)]
    host: Option<String>,

    /// Bind port, overrides MAPSPEAK_PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = AppConfig::from_env().context("failed to load configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let store = PostgisStore::connect(&config.database_url)
        .await
        .context("failed to connect to PostGIS")?;

    let generator = create_generator(&config.llm, config.generation_timeout_secs);
    tracing::info!(backend = generator.provider_name(), "generation backend ready");

    let api_config = ApiConfig {
        host: config.server.host,
        port: config.server.port,
        frontend_origin: config.server.frontend_origin,
    };
    ApiServer::new(api_config, generator, store).start().await
}
