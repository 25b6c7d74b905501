use std::fmt::Debug;

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::{error::StoreError, model::WeatherReading};

/// Partition holding the city-wide current-conditions history.
pub const CITY_PARTITION: &str = "weather_data";

/// Partition holding a location's next-day forecast history. Street-level
/// current-conditions partitions are the bare slug.
pub fn forecast_partition(slug: &str) -> String {
    format!("forecast-{slug}")
}

/// Append-only partitioned reading store.
///
/// Partitions are independent histories: `append` never overwrites and
/// `latest` returns the most recently appended entry. There is no
/// conditional-append primitive; the read-compare-append sequence in the
/// ingestion policy relies on a single-flight trigger.
#[async_trait]
pub trait WeatherStore: Send + Sync + Debug {
    async fn append(&self, partition: &str, reading: &WeatherReading) -> Result<(), StoreError>;

    async fn latest(&self, partition: &str) -> Result<Option<WeatherReading>, StoreError>;
}

/// SQLite-backed store: a single `readings` table with a partition column.
///
/// "Most recent" is the highest insertion id within a partition, which for
/// an append-only history equals chronological order. The display timestamp
/// is stored as text and never used for ordering.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to `url` and apply the schema (idempotent).
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new().connect(url).await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Private in-memory database on a single connection, so the data
    /// survives pool checkouts. Meant for tests.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS readings (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                collection     TEXT NOT NULL,
                subject        TEXT NOT NULL,
                temperature    REAL NOT NULL,
                humidity       REAL NOT NULL,
                pressure       REAL NOT NULL,
                wind_speed     REAL NOT NULL,
                wind_direction REAL NOT NULL,
                rain           REAL NOT NULL,
                snow           REAL NOT NULL,
                cloudiness     REAL NOT NULL,
                visibility     REAL NOT NULL,
                description    TEXT NOT NULL,
                condition_type TEXT NOT NULL,
                timestamp      TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_readings_collection
                ON readings (collection, id);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl WeatherStore for SqliteStore {
    async fn append(&self, partition: &str, reading: &WeatherReading) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO readings (
                collection, subject, temperature, humidity, pressure,
                wind_speed, wind_direction, rain, snow, cloudiness,
                visibility, description, condition_type, timestamp
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(partition)
        .bind(&reading.subject)
        .bind(reading.temperature)
        .bind(reading.humidity)
        .bind(reading.pressure)
        .bind(reading.wind_speed)
        .bind(reading.wind_direction)
        .bind(reading.rain)
        .bind(reading.snow)
        .bind(reading.cloudiness)
        .bind(reading.visibility)
        .bind(&reading.description)
        .bind(&reading.condition_type)
        .bind(&reading.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn latest(&self, partition: &str) -> Result<Option<WeatherReading>, StoreError> {
        let row = sqlx::query_as::<_, WeatherReading>(
            r#"
            SELECT subject, temperature, humidity, pressure, wind_speed,
                   wind_direction, rain, snow, cloudiness, visibility,
                   description, condition_type, timestamp
            FROM readings
            WHERE collection = ?1
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(partition)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(subject: &str, temperature: f64) -> WeatherReading {
        WeatherReading {
            subject: subject.to_string(),
            temperature,
            humidity: 70.0,
            pressure: 1010.0,
            wind_speed: 2.0,
            wind_direction: 0.0,
            rain: 0.0,
            snow: 0.0,
            cloudiness: 40.0,
            visibility: 0.0,
            description: "clear sky".to_string(),
            condition_type: "Clear".to_string(),
            timestamp: "01/01/2026, 08:00:00".to_string(),
        }
    }

    #[test]
    fn forecast_partition_prefixes_the_slug() {
        assert_eq!(forecast_partition("slamet-riyadi"), "forecast-slamet-riyadi");
    }

    #[tokio::test]
    async fn empty_partition_has_no_latest() {
        let store = SqliteStore::in_memory().await.unwrap();

        assert_eq!(store.latest("slamet-riyadi").await.unwrap(), None);
    }

    #[tokio::test]
    async fn latest_returns_the_most_recently_appended_row() {
        let store = SqliteStore::in_memory().await.unwrap();

        store.append("slamet-riyadi", &reading("slamet-riyadi", 29.0)).await.unwrap();
        store.append("slamet-riyadi", &reading("slamet-riyadi", 30.0)).await.unwrap();
        store.append("slamet-riyadi", &reading("slamet-riyadi", 31.0)).await.unwrap();

        let latest = store.latest("slamet-riyadi").await.unwrap().unwrap();
        assert_eq!(latest.temperature, 31.0);
    }

    #[tokio::test]
    async fn partitions_are_isolated() {
        let store = SqliteStore::in_memory().await.unwrap();

        store.append(CITY_PARTITION, &reading("Samarinda", 28.0)).await.unwrap();
        store
            .append("slamet-riyadi", &reading("slamet-riyadi", 30.0))
            .await
            .unwrap();
        store
            .append(&forecast_partition("slamet-riyadi"), &reading("slamet-riyadi", 25.0))
            .await
            .unwrap();

        assert_eq!(
            store.latest(CITY_PARTITION).await.unwrap().unwrap().subject,
            "Samarinda"
        );
        assert_eq!(
            store.latest("slamet-riyadi").await.unwrap().unwrap().temperature,
            30.0
        );
        assert_eq!(
            store
                .latest(&forecast_partition("slamet-riyadi"))
                .await
                .unwrap()
                .unwrap()
                .temperature,
            25.0
        );
    }

    #[tokio::test]
    async fn round_trips_every_field() {
        let store = SqliteStore::in_memory().await.unwrap();

        let mut stored = reading("antasari", 26.5);
        stored.rain = 2.3;
        stored.wind_direction = 230.0;
        stored.description = "light rain".to_string();
        stored.condition_type = "rain".to_string();

        store.append("antasari", &stored).await.unwrap();

        assert_eq!(store.latest("antasari").await.unwrap().unwrap(), stored);
    }
}
