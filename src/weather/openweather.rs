//! # OpenWeather Client
//!
//! HTTP implementation of [`WeatherProvider`] for the OpenWeather
//! "current weather" endpoint.
//!
//! Request: `GET {base_url}?lat=..&lon=..&appid=..&units=metric`
//!
//! Expected response (other fields are ignored):
//!
//! ```json
//! {
//!   "main": { "temp": 11.3, "humidity": 52 },
//!   "weather": [ { "description": "broken clouds" } ],
//!   "wind": { "speed": 4.1 }
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{WeatherProvider, WeatherReading};
use crate::config::WeatherConfig;
use crate::error::{Result, TelemetryError};
use crate::geo::Waypoint;

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    main: MainConditions,
    weather: Vec<Condition>,
    wind: Wind,
}

#[derive(Debug, Deserialize)]
struct MainConditions {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: f64,
}

/// Parse an OpenWeather response body into a [`WeatherReading`].
///
/// # Errors
///
/// Returns an error if the body is not JSON, misses any of the expected
/// fields, or carries an empty `weather` array.
pub fn parse_response(body: &str) -> Result<WeatherReading> {
    let current: CurrentWeather = serde_json::from_str(body)?;
    let condition = current
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| TelemetryError::Weather("response has no weather conditions".to_string()))?;

    Ok(WeatherReading {
        temperature: Some(current.main.temp),
        humidity: Some(current.main.humidity),
        description: condition.description,
        wind_speed: Some(current.wind.speed),
    })
}

/// OpenWeather HTTP client.
pub struct OpenWeatherClient {
    http: reqwest::Client,
    base_url: String,
    units: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for OpenWeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherClient")
            .field("base_url", &self.base_url)
            .field("units", &self.units)
            .field("has_api_key", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

impl OpenWeatherClient {
    /// Create a client from configuration.
    ///
    /// A missing `api_key` is accepted; every fetch then fails and the
    /// adapter reports unknown conditions.
    pub fn new(config: &WeatherConfig, api_key: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            units: config.units.clone(),
            api_key: api_key.filter(|key| !key.is_empty()),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn fetch(&self, at: &Waypoint) -> Result<WeatherReading> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TelemetryError::Weather("no API credential configured".to_string()))?;

        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("lat", at.lat.to_string()),
                ("lon", at.lng.to_string()),
                ("appid", api_key.to_string()),
                ("units", self.units.clone()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        debug!("Weather response ({} bytes) for ({:.5}, {:.5})", body.len(), at.lat, at.lng);

        parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather_config() -> WeatherConfig {
        WeatherConfig {
            base_url: "http://127.0.0.1:9/weather".to_string(),
            units: "metric".to_string(),
            timeout_ms: 200,
            api_key_env: "OPENWEATHER_API_KEY".to_string(),
        }
    }

    #[test]
    fn test_parse_full_response() {
        let body = r#"{
            "coord": {"lon": -114.07, "lat": 51.05},
            "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds"}],
            "main": {"temp": 11.3, "feels_like": 9.8, "humidity": 52},
            "wind": {"speed": 4.1, "deg": 250}
        }"#;

        let reading = parse_response(body).unwrap();
        assert_eq!(reading.temperature, Some(11.3));
        assert_eq!(reading.humidity, Some(52.0));
        assert_eq!(reading.description, "broken clouds");
        assert_eq!(reading.wind_speed, Some(4.1));
    }

    #[test]
    fn test_parse_uses_first_condition() {
        let body = r#"{
            "weather": [{"description": "light rain"}, {"description": "mist"}],
            "main": {"temp": 3.0, "humidity": 90},
            "wind": {"speed": 1.0}
        }"#;
        assert_eq!(parse_response(body).unwrap().description, "light rain");
    }

    #[test]
    fn test_parse_empty_conditions_is_malformed() {
        let body = r#"{"weather": [], "main": {"temp": 3.0, "humidity": 90}, "wind": {"speed": 1.0}}"#;
        assert!(matches!(parse_response(body), Err(TelemetryError::Weather(_))));
    }

    #[test]
    fn test_parse_missing_fields_is_malformed() {
        let body = r#"{"cod": 401, "message": "Invalid API key"}"#;
        assert!(matches!(parse_response(body), Err(TelemetryError::Json(_))));
    }

    #[test]
    fn test_parse_not_json() {
        assert!(parse_response("<html>Bad Gateway</html>").is_err());
    }

    #[tokio::test]
    async fn test_fetch_without_api_key_fails() {
        let client = OpenWeatherClient::new(&weather_config(), None).unwrap();
        assert!(!client.has_api_key());

        let result = client.fetch(&Waypoint::new(51.0, -114.0)).await;
        assert!(matches!(result, Err(TelemetryError::Weather(_))));
    }

    #[test]
    fn test_empty_api_key_is_treated_as_missing() {
        let client = OpenWeatherClient::new(&weather_config(), Some(String::new())).unwrap();
        assert!(!client.has_api_key());
    }

    #[tokio::test]
    async fn test_fetch_transport_error() {
        // Port 9 (discard) is not expected to serve HTTP
        let client = OpenWeatherClient::new(&weather_config(), Some("key".to_string())).unwrap();
        let result = client.fetch(&Waypoint::new(51.0, -114.0)).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = OpenWeatherClient::new(&weather_config(), Some("secret-key".to_string())).unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("has_api_key: true"));
    }
}
