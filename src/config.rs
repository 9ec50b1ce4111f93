//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration. The weather API credential is never stored in the
//! file; `weather.api_key_env` names the environment variable to read it from.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{Result, TelemetryError};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "DRONE_TELEMETRY_CONFIG";

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sampler: SamplerConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub recorder: RecorderConfig,
}

/// Distribution server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS origin allowed to open the telemetry socket ("*" for any).
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

/// Telemetry sampler configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SamplerConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_route_path")]
    pub route_path: String,
}

/// Weather provider configuration
#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,

    #[serde(default = "default_weather_units")]
    pub units: String,

    #[serde(default = "default_weather_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

/// Local flight recorder configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RecorderConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 4000 }
fn default_allowed_origin() -> String { "http://localhost:3000".to_string() }

fn default_interval_ms() -> u64 { 1000 }
fn default_route_path() -> String { "data/route.json".to_string() }

fn default_weather_base_url() -> String { "https://api.openweathermap.org/data/2.5/weather".to_string() }
fn default_weather_units() -> String { "metric".to_string() }
fn default_weather_timeout_ms() -> u64 { 5000 }
fn default_api_key_env() -> String { "OPENWEATHER_API_KEY".to_string() }

fn default_data_dir() -> String { "./data/history".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origin: default_allowed_origin(),
        }
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            route_path: default_route_path(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            units: default_weather_units(),
            timeout_ms: default_weather_timeout_ms(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            data_dir: default_data_dir(),
        }
    }
}

/// Configuration error carrying `msg`
pub(crate) fn invalid(msg: impl std::fmt::Display) -> TelemetryError {
    TelemetryError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use drone_telemetry::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Read the weather API credential from the configured environment variable
    pub fn weather_api_key(&self) -> Option<String> {
        std::env::var(&self.weather.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(invalid("server host cannot be empty"));
        }

        if self.server.port == 0 {
            return Err(invalid("server port must be greater than 0"));
        }

        if self.server.allowed_origin.is_empty() {
            return Err(invalid("allowed_origin cannot be empty (use \"*\" to allow any)"));
        }

        if self.sampler.interval_ms == 0 || self.sampler.interval_ms > 60000 {
            return Err(invalid("interval_ms must be between 1 and 60000"));
        }

        if self.sampler.route_path.is_empty() {
            return Err(invalid("route_path cannot be empty"));
        }

        if !(self.weather.base_url.starts_with("http://") || self.weather.base_url.starts_with("https://")) {
            return Err(invalid("weather base_url must be an http(s) URL"));
        }

        // Readings are reported in °C and m/s
        if self.weather.units != "metric" {
            return Err(invalid("weather units must be 'metric' (only supported unit system)"));
        }

        if self.weather.timeout_ms == 0 || self.weather.timeout_ms > 60000 {
            return Err(invalid("weather timeout_ms must be between 1 and 60000"));
        }

        if self.weather.api_key_env.is_empty() {
            return Err(invalid("api_key_env cannot be empty"));
        }

        if self.recorder.enabled && self.recorder.data_dir.is_empty() {
            return Err(invalid("recorder data_dir cannot be empty when enabled"));
        }

        Ok(())
    }
}
