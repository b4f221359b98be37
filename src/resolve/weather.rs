//! Current-temperature lookup.
//!
//! The lookup is infallible from the caller's point of view: any transport,
//! status or decoding failure resolves to the configured fallback
//! temperature. One attempt per request, no retries.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::WeatherConfig;

/// Source of the current air temperature at a coordinate.
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    /// Temperature in °C. Must not fail; implementations fall back internally.
    async fn temperature_c(&self, lat: f64, lon: f64) -> f64;
}

/// Always answers with the same temperature. Used when weather is disabled.
#[derive(Debug, Clone, Copy)]
pub struct FixedTemperature(pub f64);

#[async_trait]
impl WeatherLookup for FixedTemperature {
    async fn temperature_c(&self, _lat: f64, _lon: f64) -> f64 {
        self.0
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: Option<CurrentWeather>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: Option<f64>,
}

#[derive(Debug, thiserror::Error)]
enum WeatherError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("response has no current temperature")]
    MissingTemperature,
}

/// Open-Meteo forecast client.
#[derive(Clone)]
pub struct OpenMeteoClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    fallback_c: f64,
}

impl OpenMeteoClient {
    /// Build a client bounded by `config.timeout_ms`.
    pub fn new(config: &WeatherConfig) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
            fallback_c: config.fallback_temperature_c,
        })
    }

    async fn fetch(&self, lat: f64, lon: f64) -> Result<f64, WeatherError> {
        let request = self
            .http
            .get(&self.base_url)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                ("current_weather", "true".to_string()),
            ])
            .send();

        // The client timeout covers the request; this also bounds body decoding.
        let body = tokio::time::timeout(self.timeout, async {
            let resp = request.await?.error_for_status()?;
            Ok::<_, reqwest::Error>(resp.json::<ForecastResponse>().await?)
        })
        .await
        .map_err(|_| WeatherError::Timeout(self.timeout))??;

        body.current_weather
            .and_then(|w| w.temperature)
            .filter(|t| t.is_finite())
            .ok_or(WeatherError::MissingTemperature)
    }
}

#[async_trait]
impl WeatherLookup for OpenMeteoClient {
    async fn temperature_c(&self, lat: f64, lon: f64) -> f64 {
        match self.fetch(lat, lon).await {
            Ok(t) => {
                debug!(lat, lon, temperature_c = t, "Weather lookup succeeded");
                t
            }
            Err(e) => {
                warn!(lat, lon, error = %e, fallback = self.fallback_c, "Weather lookup failed, using fallback temperature");
                self.fallback_c
            }
        }
    }
}

/// Build the lookup described by `config`.
pub fn from_config(config: &WeatherConfig) -> Result<std::sync::Arc<dyn WeatherLookup>, reqwest::Error> {
    if config.enabled {
        Ok(std::sync::Arc::new(OpenMeteoClient::new(config)?))
    } else {
        Ok(std::sync::Arc::new(FixedTemperature(config.fallback_temperature_c)))
    }
}
