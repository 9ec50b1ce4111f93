//! # Weather Module
//!
//! Enriches telemetry samples with current conditions at the vehicle position.
//!
//! This module handles:
//! - The [`WeatherReading`] data type, where every numeric field may be unknown
//! - The [`WeatherProvider`] seam over the remote weather service
//! - The [`WeatherAdapter`], which turns any provider failure into an unknown reading

pub mod openweather;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::geo::Waypoint;

pub use openweather::OpenWeatherClient;

/// Description reported when conditions could not be fetched.
pub const UNKNOWN_DESCRIPTION: &str = "N/A";

/// Weather conditions at a coordinate.
///
/// Numeric fields are `None` when the provider could not be reached or
/// returned an unusable payload. On the wire they serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    /// Air temperature in °C.
    #[serde(rename = "temp")]
    pub temperature: Option<f64>,
    /// Relative humidity in percent.
    pub humidity: Option<f64>,
    /// Human readable conditions (e.g. "scattered clouds").
    pub description: String,
    /// Wind speed in m/s.
    #[serde(rename = "windSpeed")]
    pub wind_speed: Option<f64>,
}

impl WeatherReading {
    /// The reading used whenever the provider fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use drone_telemetry::weather::WeatherReading;
    ///
    /// let reading = WeatherReading::unknown();
    /// assert!(reading.is_unknown());
    /// assert_eq!(reading.description, "N/A");
    /// ```
    pub fn unknown() -> Self {
        Self {
            temperature: None,
            humidity: None,
            description: UNKNOWN_DESCRIPTION.to_string(),
            wind_speed: None,
        }
    }

    /// True when no numeric field carries a value.
    pub fn is_unknown(&self) -> bool {
        self.temperature.is_none() && self.humidity.is_none() && self.wind_speed.is_none()
    }
}

impl Default for WeatherReading {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Source of weather conditions. Implementations may fail.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Fetch current conditions at `at`.
    async fn fetch(&self, at: &Waypoint) -> Result<WeatherReading>;
}

/// Infallible wrapper around a [`WeatherProvider`].
///
/// Each call performs exactly one provider request: no retry, no caching.
#[derive(Debug)]
pub struct WeatherAdapter<P> {
    provider: P,
}

impl<P: WeatherProvider> WeatherAdapter<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Fetch conditions at `at`, degrading to [`WeatherReading::unknown`] on any failure.
    pub async fn fetch(&self, at: &Waypoint) -> WeatherReading {
        match self.provider.fetch(at).await {
            Ok(reading) => reading,
            Err(e) => {
                warn!("Error getting weather at ({:.5}, {:.5}): {}", at.lat, at.lng, e);
                WeatherReading::unknown()
            }
        }
    }
}
