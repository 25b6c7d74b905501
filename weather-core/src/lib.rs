//! Core library for the Samarinda weather crawler.
//!
//! This crate defines:
//! - Immutable service configuration and the fixed subject table
//! - The OpenWeather provider (current conditions + 3-hour forecast)
//! - The append-only partitioned reading store
//! - The ingestion policy (change detection, forecast routing)
//!
//! It is used by `weather-server`, but can also be reused by other binaries.

pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod provider;
pub mod store;

pub use config::{CityConfig, Config, Coordinates, Location};
pub use error::{FetchError, StoreError};
pub use ingest::{Crawler, TickSummary};
pub use model::{Observation, WeatherReading};
pub use provider::{ForecastStep, WeatherProvider, openweather::OpenWeatherProvider};
pub use store::{CITY_PARTITION, SqliteStore, WeatherStore, forecast_partition};
