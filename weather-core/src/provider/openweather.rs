use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;

use super::{ForecastStep, WeatherProvider};
use crate::{config::Coordinates, error::FetchError, model::Observation};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
const DT_TXT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Client for the OpenWeather current-conditions and forecast endpoints.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// Point the provider at a different endpoint root (used by tests and
    /// stub deployments).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            http: Client::new(),
        }
    }

    async fn get_json(&self, endpoint: &str, coords: Coordinates) -> Result<String, FetchError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", coords.lat.to_string()),
                ("lon", coords.lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, coords: Coordinates) -> Result<Observation, FetchError> {
        let body = self.get_json("weather", coords).await?;
        let parsed: OwConditions = serde_json::from_str(&body)?;

        Ok(parsed.observation(PrecipitationField::OneHour))
    }

    async fn forecast(&self, coords: Coordinates) -> Result<Vec<ForecastStep>, FetchError> {
        let body = self.get_json("forecast", coords).await?;
        let parsed: OwForecastResponse = serde_json::from_str(&body)?;

        parsed
            .list
            .into_iter()
            .map(|entry| {
                let valid_at = NaiveDateTime::parse_from_str(&entry.dt_txt, DT_TXT_FORMAT)
                    .map_err(|e| {
                        FetchError::Payload(format!(
                            "forecast entry has malformed dt_txt {:?}: {e}",
                            entry.dt_txt
                        ))
                    })?;

                Ok(ForecastStep {
                    valid_at,
                    observation: entry.conditions.observation(PrecipitationField::ThreeHours),
                })
            })
            .collect()
    }
}

/// Which precipitation volume key applies: current conditions report `1h`,
/// forecast steps report `3h`.
#[derive(Debug, Clone, Copy)]
enum PrecipitationField {
    OneHour,
    ThreeHours,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    main: String,
}

#[derive(Debug, Deserialize)]
struct OwClouds {
    all: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwPrecipitation {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
    #[serde(rename = "3h")]
    three_hours: Option<f64>,
}

impl OwPrecipitation {
    fn volume(&self, field: PrecipitationField) -> f64 {
        match field {
            PrecipitationField::OneHour => self.one_hour,
            PrecipitationField::ThreeHours => self.three_hours,
        }
        .unwrap_or(0.0)
    }
}

/// Nested condition shape shared by the current-conditions response and
/// each forecast list entry.
#[derive(Debug, Deserialize)]
struct OwConditions {
    main: OwMain,
    wind: OwWind,
    weather: Vec<OwWeather>,
    clouds: Option<OwClouds>,
    visibility: Option<f64>,
    rain: Option<OwPrecipitation>,
    snow: Option<OwPrecipitation>,
}

impl OwConditions {
    /// Normalize into the domain shape: substitute 0 for absent optional
    /// fields and derive `condition_type` ("rain" if a rain object is
    /// present, else "snow", else the primary condition category).
    fn observation(&self, precip: PrecipitationField) -> Observation {
        let primary = self.weather.first();

        let description = primary
            .map(|w| w.description.clone())
            .unwrap_or_else(|| "Unknown".to_string());

        let condition_type = if self.rain.is_some() {
            "rain".to_string()
        } else if self.snow.is_some() {
            "snow".to_string()
        } else {
            primary
                .map(|w| w.main.clone())
                .unwrap_or_else(|| "Unknown".to_string())
        };

        Observation {
            temperature: self.main.temp,
            humidity: self.main.humidity,
            pressure: self.main.pressure,
            wind_speed: self.wind.speed,
            wind_direction: self.wind.deg.unwrap_or(0.0),
            rain: self.rain.as_ref().map(|p| p.volume(precip)).unwrap_or(0.0),
            snow: self.snow.as_ref().map(|p| p.volume(precip)).unwrap_or(0.0),
            cloudiness: self.clouds.as_ref().and_then(|c| c.all).unwrap_or(0.0),
            visibility: self.visibility.unwrap_or(0.0),
            description,
            condition_type,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt_txt: String,
    #[serde(flatten)]
    conditions: OwConditions,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        format!("{}...", &body[..MAX])
    } else {
        body.to_string()
    }
}
