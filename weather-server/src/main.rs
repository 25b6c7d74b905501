//! Binary crate for the Samarinda weather crawler service.
//!
//! This crate focuses on:
//! - Parsing flags and environment configuration
//! - Wiring the store, provider and crawler together
//! - Serving the HTTP trigger and read endpoints

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use weather_core::{Config, Crawler, OpenWeatherProvider, SqliteStore, WeatherStore};
use weather_server::routes::{AppState, build_router};

/// Command-line and environment configuration.
#[derive(Debug, Parser)]
#[command(name = "weather-server", version, about = "Samarinda weather crawler")]
struct Args {
    /// OpenWeather API key.
    #[arg(long, env = "API_KEY")]
    api_key: String,

    /// Listening port.
    #[arg(long, env = "PORT", default_value_t = 5500)]
    port: u16,

    /// SQLite database URL for the reading store.
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:weather.db?mode=rwc")]
    database_url: String,

    /// Override the upstream API endpoint root (for stubs in testing).
    #[arg(long, env = "WEATHER_BASE_URL", hide = true)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = Arc::new(Config::samarinda(args.api_key));

    let store: Arc<dyn WeatherStore> = Arc::new(
        SqliteStore::connect(&args.database_url)
            .await
            .with_context(|| format!("failed to open reading store at {}", args.database_url))?,
    );

    let provider = match args.base_url {
        Some(base) => OpenWeatherProvider::with_base_url(config.api_key.clone(), base),
        None => OpenWeatherProvider::new(config.api_key.clone()),
    };

    let crawler = Crawler::new(config.clone(), Arc::new(provider), store.clone());

    let app = build_router(AppState {
        config,
        store,
        crawler,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, "server running");
    axum::serve(listener, app).await.context("server exited")?;

    Ok(())
}
