use std::fmt::Debug;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::{config::Coordinates, error::FetchError, model::Observation};

pub mod openweather;

/// One step of the upstream's 3-hour-resolution forecast list.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastStep {
    /// The step's own civil date-time as reported upstream (`dt_txt`),
    /// compared without timezone conversion.
    pub valid_at: NaiveDateTime,
    pub observation: Observation,
}

/// Abstraction over the upstream weather API.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch and normalize the current conditions at `coords`.
    async fn current(&self, coords: Coordinates) -> Result<Observation, FetchError>;

    /// Fetch the multi-day forecast at `coords`, in upstream (chronological)
    /// order.
    async fn forecast(&self, coords: Coordinates) -> Result<Vec<ForecastStep>, FetchError>;
}
