use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::{
    config::{Config, Coordinates, Location},
    error::{FetchError, StoreError},
    model::{WeatherReading, format_timestamp},
    provider::{ForecastStep, WeatherProvider},
    store::{CITY_PARTITION, WeatherStore, forecast_partition},
};

/// Counters for one ingestion tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// Readings appended (current conditions and forecasts).
    pub stored: usize,
    /// Subjects skipped: nothing changed, or no forecast entry for tomorrow.
    pub skipped: usize,
    /// Subjects whose fetch or store failed.
    pub failed: usize,
}

/// The ingestion policy: fetch, compare against the latest stored reading,
/// append only on change. Forecasts bypass change detection and go to their
/// own partitions.
///
/// The read-latest/compare/append sequence is not atomic. The trigger is
/// assumed single-flight (one external scheduler), so two concurrent ticks
/// for the same subject could both append.
#[derive(Debug, Clone)]
pub struct Crawler {
    config: Arc<Config>,
    provider: Arc<dyn WeatherProvider>,
    store: Arc<dyn WeatherStore>,
}

#[derive(Debug, thiserror::Error)]
enum IngestFailure {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Crawler {
    pub fn new(
        config: Arc<Config>,
        provider: Arc<dyn WeatherProvider>,
        store: Arc<dyn WeatherStore>,
    ) -> Self {
        Self {
            config,
            provider,
            store,
        }
    }

    /// Run one full ingestion tick: the city-wide fetch, then every
    /// location, then every location's next-day forecast, strictly in
    /// sequence. Failures are isolated per subject and only counted.
    pub async fn run_tick(&self) -> TickSummary {
        let mut summary = TickSummary::default();

        self.ingest_city(&mut summary).await;
        self.ingest_locations(&mut summary).await;
        self.ingest_forecasts(&mut summary).await;

        info!(
            stored = summary.stored,
            skipped = summary.skipped,
            failed = summary.failed,
            "ingestion tick finished"
        );
        summary
    }

    async fn ingest_city(&self, summary: &mut TickSummary) {
        let city = &self.config.city;

        match self
            .ingest_current(&city.name, CITY_PARTITION, city.coordinates)
            .await
        {
            Ok(true) => summary.stored += 1,
            Ok(false) => summary.skipped += 1,
            Err(e) => {
                warn!(subject = %city.name, error = %e, "city-wide ingestion failed");
                summary.failed += 1;
            }
        }
    }

    async fn ingest_locations(&self, summary: &mut TickSummary) {
        for location in &self.config.locations {
            match self
                .ingest_current(&location.slug, &location.slug, location.coordinates)
                .await
            {
                Ok(true) => summary.stored += 1,
                Ok(false) => summary.skipped += 1,
                Err(e) => {
                    warn!(subject = %location.slug, error = %e, "location ingestion failed");
                    summary.failed += 1;
                }
            }
        }
    }

    async fn ingest_forecasts(&self, summary: &mut TickSummary) {
        // Tomorrow in the fixed civil calendar, from the current UTC date.
        let tomorrow = Utc::now().date_naive() + Days::new(1);

        for location in &self.config.locations {
            match self.ingest_forecast(location, tomorrow).await {
                Ok(true) => summary.stored += 1,
                Ok(false) => summary.skipped += 1,
                Err(e) => {
                    warn!(subject = %location.slug, error = %e, "forecast ingestion failed");
                    summary.failed += 1;
                }
            }
        }
    }

    async fn ingest_current(
        &self,
        subject: &str,
        partition: &str,
        coords: Coordinates,
    ) -> Result<bool, IngestFailure> {
        let observation = self.provider.current(coords).await?;
        let reading = observation.into_reading(subject, format_timestamp(Utc::now()));

        Ok(self.store_if_changed(partition, reading).await?)
    }

    /// Append `reading` unless it matches the most recently stored entry in
    /// `partition`. Returns whether a row was appended.
    async fn store_if_changed(
        &self,
        partition: &str,
        reading: WeatherReading,
    ) -> Result<bool, StoreError> {
        if let Some(latest) = self.store.latest(partition).await? {
            if !reading.differs_from(&latest) {
                debug!(subject = %reading.subject, "no change, skipping append");
                return Ok(false);
            }
        }

        self.store.append(partition, &reading).await?;
        info!(
            subject = %reading.subject,
            partition,
            timestamp = %reading.timestamp,
            "reading stored"
        );
        Ok(true)
    }

    /// Append the first forecast step dated `tomorrow`, unconditionally.
    /// Returns false without error when no step matches.
    async fn ingest_forecast(
        &self,
        location: &Location,
        tomorrow: NaiveDate,
    ) -> Result<bool, IngestFailure> {
        let steps = self.provider.forecast(location.coordinates).await?;

        let Some(step) = first_step_on(&steps, tomorrow) else {
            debug!(subject = %location.slug, %tomorrow, "no forecast entry for tomorrow");
            return Ok(false);
        };

        let reading = step
            .observation
            .clone()
            .into_reading(location.slug.clone(), format_timestamp(Utc::now()));

        let partition = forecast_partition(&location.slug);
        self.store.append(&partition, &reading).await?;
        info!(subject = %reading.subject, partition = %partition, "forecast stored");
        Ok(true)
    }
}

/// First step whose `dt_txt` date equals `date`, in list order. The
/// upstream list is chronological, so this is the lowest time of day.
pub fn first_step_on(steps: &[ForecastStep], date: NaiveDate) -> Option<&ForecastStep> {
    steps.iter().find(|step| step.valid_at.date() == date)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDateTime;

    use super::*;
    use crate::config::CityConfig;
    use crate::model::Observation;

    fn observation(temperature: f64) -> Observation {
        Observation {
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
        }
    }

    fn step(valid_at: NaiveDateTime, temperature: f64) -> ForecastStep {
        ForecastStep {
            valid_at,
            observation: observation(temperature),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_config() -> Arc<Config> {
        Arc::new(Config {
            api_key: "test-key".to_string(),
            city: CityConfig {
                name: "Samarinda".to_string(),
                coordinates: Coordinates {
                    lat: -0.494823,
                    lon: 117.143616,
                },
            },
            locations: vec![Location::new("slamet-riyadi", -0.51, 117.12)],
        })
    }

    /// Provider returning a fixed current observation and forecast list;
    /// both can be swapped between ticks.
    #[derive(Debug)]
    struct ScriptedProvider {
        current: Mutex<Result<Observation, String>>,
        steps: Mutex<Vec<ForecastStep>>,
    }

    impl ScriptedProvider {
        fn new(current: Observation, steps: Vec<ForecastStep>) -> Self {
            Self {
                current: Mutex::new(Ok(current)),
                steps: Mutex::new(steps),
            }
        }

        fn failing() -> Self {
            Self {
                current: Mutex::new(Err("upstream down".to_string())),
                steps: Mutex::new(Vec::new()),
            }
        }

        fn set_current(&self, obs: Observation) {
            *self.current.lock().unwrap() = Ok(obs);
        }
    }

    #[async_trait]
    impl WeatherProvider for ScriptedProvider {
        async fn current(&self, _coords: Coordinates) -> Result<Observation, FetchError> {
            self.current
                .lock()
                .unwrap()
                .clone()
                .map_err(FetchError::Payload)
        }

        async fn forecast(&self, _coords: Coordinates) -> Result<Vec<ForecastStep>, FetchError> {
            Ok(self.steps.lock().unwrap().clone())
        }
    }

    /// In-memory store giving tests full visibility into partitions.
    #[derive(Debug, Default)]
    struct MemoryStore {
        partitions: Mutex<HashMap<String, Vec<WeatherReading>>>,
    }

    impl MemoryStore {
        fn len(&self, partition: &str) -> usize {
            self.partitions
                .lock()
                .unwrap()
                .get(partition)
                .map_or(0, Vec::len)
        }
    }

    #[async_trait]
    impl WeatherStore for MemoryStore {
        async fn append(&self, partition: &str, reading: &WeatherReading) -> Result<(), StoreError> {
            self.partitions
                .lock()
                .unwrap()
                .entry(partition.to_string())
                .or_default()
                .push(reading.clone());
            Ok(())
        }

        async fn latest(&self, partition: &str) -> Result<Option<WeatherReading>, StoreError> {
            Ok(self
                .partitions
                .lock()
                .unwrap()
                .get(partition)
                .and_then(|entries| entries.last().cloned()))
        }
    }

    fn tomorrow_midnight() -> NaiveDateTime {
        (Utc::now().date_naive() + Days::new(1))
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn crawler(
        provider: Arc<ScriptedProvider>,
        store: Arc<MemoryStore>,
    ) -> Crawler {
        Crawler::new(test_config(), provider, store)
    }

    #[tokio::test]
    async fn first_tick_appends_for_every_subject() {
        let provider = Arc::new(ScriptedProvider::new(
            observation(30.0),
            vec![step(tomorrow_midnight(), 27.0)],
        ));
        let store = Arc::new(MemoryStore::default());

        let summary = crawler(provider, store.clone()).run_tick().await;

        // City, one location, one forecast.
        assert_eq!(summary, TickSummary { stored: 3, skipped: 0, failed: 0 });
        assert_eq!(store.len(CITY_PARTITION), 1);
        assert_eq!(store.len("slamet-riyadi"), 1);
        assert_eq!(store.len("forecast-slamet-riyadi"), 1);

        let city = store.latest(CITY_PARTITION).await.unwrap().unwrap();
        assert_eq!(city.subject, "Samarinda");
    }

    #[tokio::test]
    async fn unchanged_tick_skips_current_but_appends_forecast() {
        let provider = Arc::new(ScriptedProvider::new(
            observation(30.0),
            vec![step(tomorrow_midnight(), 27.0)],
        ));
        let store = Arc::new(MemoryStore::default());
        let crawler = crawler(provider, store.clone());

        crawler.run_tick().await;
        let second = crawler.run_tick().await;

        // Current-conditions partitions are deduplicated, the forecast
        // partition grows every tick.
        assert_eq!(second, TickSummary { stored: 1, skipped: 2, failed: 0 });
        assert_eq!(store.len(CITY_PARTITION), 1);
        assert_eq!(store.len("slamet-riyadi"), 1);
        assert_eq!(store.len("forecast-slamet-riyadi"), 2);
    }

    #[tokio::test]
    async fn changed_observation_appends_again() {
        let provider = Arc::new(ScriptedProvider::new(observation(30.0), Vec::new()));
        let store = Arc::new(MemoryStore::default());
        let crawler = crawler(provider.clone(), store.clone());

        crawler.run_tick().await;
        provider.set_current(observation(31.5));
        let second = crawler.run_tick().await;

        assert_eq!(second.stored, 2);
        assert_eq!(store.len(CITY_PARTITION), 2);
        assert_eq!(
            store.latest(CITY_PARTITION).await.unwrap().unwrap().temperature,
            31.5
        );
    }

    #[tokio::test]
    async fn no_tomorrow_entry_skips_silently() {
        let yesterday = (Utc::now().date_naive() - Days::new(1))
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let provider = Arc::new(ScriptedProvider::new(
            observation(30.0),
            vec![step(yesterday, 27.0)],
        ));
        let store = Arc::new(MemoryStore::default());

        let summary = crawler(provider, store.clone()).run_tick().await;

        assert_eq!(summary.failed, 0);
        assert_eq!(store.len("forecast-slamet-riyadi"), 0);
    }

    #[tokio::test]
    async fn fetch_failures_are_isolated_per_subject() {
        let provider = Arc::new(ScriptedProvider::failing());
        let store = Arc::new(MemoryStore::default());

        let summary = crawler(provider, store.clone()).run_tick().await;

        // City and location fetches fail; the (empty) forecast list still
        // processes and skips.
        assert_eq!(summary, TickSummary { stored: 0, skipped: 1, failed: 2 });
        assert_eq!(store.len(CITY_PARTITION), 0);
        assert_eq!(store.len("slamet-riyadi"), 0);
    }

    #[test]
    fn first_step_on_picks_the_earliest_matching_entry() {
        let steps = vec![
            step(date(2026, 3, 14).and_hms_opt(21, 0, 0).unwrap(), 29.0),
            step(date(2026, 3, 15).and_hms_opt(0, 0, 0).unwrap(), 26.0),
            step(date(2026, 3, 15).and_hms_opt(3, 0, 0).unwrap(), 25.0),
            step(date(2026, 3, 16).and_hms_opt(0, 0, 0).unwrap(), 24.0),
        ];

        let selected = first_step_on(&steps, date(2026, 3, 15)).unwrap();
        assert_eq!(selected.observation.temperature, 26.0);
    }

    #[test]
    fn first_step_on_returns_none_without_a_match() {
        let steps = vec![step(date(2026, 3, 14).and_hms_opt(12, 0, 0).unwrap(), 29.0)];

        assert!(first_step_on(&steps, date(2026, 3, 20)).is_none());
        assert!(first_step_on(&[], date(2026, 3, 15)).is_none());
    }
}
