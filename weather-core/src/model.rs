use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Display time zone for capture timestamps: Asia/Makassar, UTC+8.
const DISPLAY_OFFSET_SECS: i32 = 8 * 3600;

/// Normalized weather fields shared by current conditions and forecast
/// steps: optional upstream fields are already substituted with 0 and
/// `condition_type` is derived (see `provider::openweather`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub rain: f64,
    pub snow: f64,
    pub cloudiness: f64,
    pub visibility: f64,
    pub description: String,
    pub condition_type: String,
}

impl Observation {
    /// Stamp this observation with its subject and capture time.
    pub fn into_reading(self, subject: impl Into<String>, timestamp: String) -> WeatherReading {
        WeatherReading {
            subject: subject.into(),
            temperature: self.temperature,
            humidity: self.humidity,
            pressure: self.pressure,
            wind_speed: self.wind_speed,
            wind_direction: self.wind_direction,
            rain: self.rain,
            snow: self.snow,
            cloudiness: self.cloudiness,
            visibility: self.visibility,
            description: self.description,
            condition_type: self.condition_type,
            timestamp,
        }
    }
}

/// A stored reading: one row of a subject's append-only history. Never
/// mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WeatherReading {
    /// City name or location slug.
    pub subject: String,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub rain: f64,
    pub snow: f64,
    pub cloudiness: f64,
    pub visibility: f64,
    pub description: String,
    pub condition_type: String,
    /// Capture time rendered in the fixed display zone; text only, never
    /// used for ordering or computation.
    pub timestamp: String,
}

impl WeatherReading {
    /// True iff any of the eleven comparable fields differ from `latest`.
    ///
    /// Numeric fields are compared for exact equality, no tolerance.
    /// `subject` and `timestamp` never participate; callers guarantee both
    /// readings belong to the same subject.
    pub fn differs_from(&self, latest: &WeatherReading) -> bool {
        self.temperature != latest.temperature
            || self.humidity != latest.humidity
            || self.pressure != latest.pressure
            || self.wind_speed != latest.wind_speed
            || self.wind_direction != latest.wind_direction
            || self.rain != latest.rain
            || self.snow != latest.snow
            || self.cloudiness != latest.cloudiness
            || self.visibility != latest.visibility
            || self.description != latest.description
            || self.condition_type != latest.condition_type
    }
}

/// Render a capture time in the fixed UTC+8 display zone, e.g.
/// `14/03/2026, 09:30:05`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    let zone = FixedOffset::east_opt(DISPLAY_OFFSET_SECS).expect("static UTC+8 offset is valid");
    at.with_timezone(&zone).format("%d/%m/%Y, %H:%M:%S").to_string()
}
