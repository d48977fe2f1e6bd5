//! OpenWeatherMap current-weather client.

use crate::types::{Position, WeatherError, WeatherReading};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Anything that can report current weather for a position.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current(
        &self,
        position: &Position,
        api_key: &str,
    ) -> Result<WeatherReading, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    main: MainSection,
    #[serde(default)]
    weather: Vec<ConditionEntry>,
    wind: WindSection,
}

#[derive(Debug, Deserialize)]
struct MainSection {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct ConditionEntry {
    description: String,
}

#[derive(Debug, Deserialize)]
struct WindSection {
    speed: f64,
}

impl CurrentResponse {
    fn into_reading(self) -> Result<WeatherReading, WeatherError> {
        let condition = self
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::Parse("response has no weather entry".to_string()))?;

        Ok(WeatherReading {
            temperature_celsius: self.main.temp,
            condition_description: condition.description,
            wind_speed_mps: self.wind.speed,
            fetched_at: Utc::now(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Client,
    base_url: String,
}

impl WeatherProvider {
    pub fn new(base_url: &str) -> Result<Self, WeatherError> {
        Self::with_timeout(base_url, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }
}

#[async_trait]
impl WeatherSource for WeatherProvider {
    async fn current(
        &self,
        position: &Position,
        api_key: &str,
    ) -> Result<WeatherReading, WeatherError> {
        tracing::debug!(
            lat = position.latitude,
            lon = position.longitude,
            "Requesting current weather"
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", position.latitude.to_string()),
                ("lon", position.longitude.to_string()),
                ("appid", api_key.to_string()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    WeatherError::Timeout
                } else {
                    WeatherError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status(status.as_u16()));
        }

        let body: CurrentResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))?;

        body.into_reading()
    }
}
