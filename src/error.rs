//! # Error Types
//!
//! Custom error types for Drone Telemetry using `thiserror`.

use thiserror::Error;

/// Main error type for Drone Telemetry
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Route table could not be loaded or is invalid
    #[error("Route error: {0}")]
    Route(String),

    /// Weather provider failures (never escape the weather adapter)
    #[error("Weather provider error: {0}")]
    Weather(String),

    /// HTTP transport errors from the weather provider
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Flight archive persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Drone Telemetry
pub type Result<T> = std::result::Result<T, TelemetryError>;
