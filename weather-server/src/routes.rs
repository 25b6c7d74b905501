//! Router and handlers: the ingestion trigger plus latest-reading reads.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use weather_core::{
    CITY_PARTITION, Config, Crawler, WeatherReading, WeatherStore, forecast_partition,
};

use crate::error::{ApiError, Result};

/// Shared state for the handlers; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn WeatherStore>,
    pub crawler: Crawler,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(trigger_tick))
        .route("/health", get(health))
        .route("/weather", get(city_weather))
        .route("/weather/:location", get(location_weather))
        .route("/tomorrow/:location", get(location_forecast))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `GET /` — run one full ingestion tick and confirm.
async fn trigger_tick(State(state): State<AppState>) -> String {
    let summary = state.crawler.run_tick().await;

    format!(
        "Weather data for Samarinda and specific locations has been fetched and stored \
         ({} stored, {} skipped, {} failed).",
        summary.stored, summary.skipped, summary.failed
    )
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// `GET /weather` — latest city-wide reading.
async fn city_weather(State(state): State<AppState>) -> Result<Json<WeatherReading>> {
    let reading = state.store.latest(CITY_PARTITION).await?.ok_or_else(|| {
        ApiError::NotFound(format!(
            "No weather data found for {}",
            state.config.city.name
        ))
    })?;

    Ok(Json(reading))
}

/// `GET /weather/:location` — latest reading for a configured location.
async fn location_weather(
    State(state): State<AppState>,
    Path(location): Path<String>,
) -> Result<Json<WeatherReading>> {
    require_known(&state.config, &location)?;

    let reading = state.store.latest(&location).await?.ok_or_else(|| {
        ApiError::NotFound(format!("No weather data found for location: {location}"))
    })?;

    Ok(Json(reading))
}

/// `GET /tomorrow/:location` — latest next-day forecast for a location.
async fn location_forecast(
    State(state): State<AppState>,
    Path(location): Path<String>,
) -> Result<Json<WeatherReading>> {
    require_known(&state.config, &location)?;

    let partition = forecast_partition(&location);
    let reading = state.store.latest(&partition).await?.ok_or_else(|| {
        ApiError::NotFound(format!(
            "No forecast data found for tomorrow at location: {location}"
        ))
    })?;

    Ok(Json(reading))
}

fn require_known(config: &Config, slug: &str) -> Result<()> {
    if config.is_known_location(slug) {
        Ok(())
    } else {
        Err(ApiError::InvalidLocation(slug.to_string()))
    }
}
