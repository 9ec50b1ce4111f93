//! # Drone Telemetry Library
//!
//! Simulated live telemetry for a drone flying a fixed route.
//!
//! This library provides the telemetry pipeline (route walking, weather
//! enrichment, WebSocket fan-out to observers) and the observer-side flight
//! history model (session aggregation, great-circle distance, persisted
//! flight archive, report export).

pub mod archive;
pub mod config;
pub mod error;
pub mod export;
pub mod geo;
pub mod route;
pub mod server;
pub mod session;
pub mod telemetry;
pub mod weather;
