//! # Drone Telemetry
//!
//! Simulated drone telemetry server.
//!
//! Walks the configured route once per interval, enriches every position
//! with current weather, and pushes the resulting samples to all WebSocket
//! observers on `/telemetry`.

use std::future::IntoFuture;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::Duration;
use tracing::{info, warn};

use drone_telemetry::archive::{FileStore, FlightArchive};
use drone_telemetry::config::{Config, CONFIG_PATH_ENV};
use drone_telemetry::route::RouteTable;
use drone_telemetry::server;
use drone_telemetry::session::record_until;
use drone_telemetry::telemetry::{run_sampler, DistributionHub, IntervalTicker, Sampler};
use drone_telemetry::weather::{OpenWeatherClient, WeatherAdapter};

/// Configuration path from the first argument, then the environment.
fn config_path() -> Option<String> {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
}

/// Main entry point for the Drone Telemetry server
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load configuration and the route table
///    - Start the sampler on a fixed interval
///
/// 2. **Serving**
///    - Accept WebSocket observers until Ctrl+C
///
/// 3. **Graceful Shutdown**
///    - Stop the sampler
///    - Save the locally recorded flight, if the recorder is enabled
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .init();

    info!("Drone Telemetry v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match config_path() {
        Some(path) => Config::load(&path).with_context(|| format!("loading configuration from {}", path))?,
        None => {
            info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    let route = RouteTable::load(&config.sampler.route_path)
        .with_context(|| format!("loading route from {}", config.sampler.route_path))?;

    let api_key = config.weather_api_key();
    if api_key.is_none() {
        warn!(
            "{} is not set; weather will be reported as unknown",
            config.weather.api_key_env
        );
    }
    let weather = WeatherAdapter::new(OpenWeatherClient::new(&config.weather, api_key)?);

    let hub = DistributionHub::new();

    // Optional local observer that records the broadcast as a flight
    let recorder = if config.recorder.enabled {
        let archive = FlightArchive::new(FileStore::open(&config.recorder.data_dir)?);
        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(record_until(hub.join(), stop_rx));
        info!("Recording flight to {}", config.recorder.data_dir);
        Some((archive, stop_tx, handle))
    } else {
        None
    };

    let sampler = Sampler::new(route, weather);
    let ticker = IntervalTicker::new(Duration::from_millis(config.sampler.interval_ms));
    let sampler_task = tokio::spawn(run_sampler(sampler, ticker, hub.clone()));

    let app = server::router(hub.clone(), &config.server.allowed_origin)?;
    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| format!("binding {}:{}", config.server.host, config.server.port))?;

    info!("Telemetry available at ws://{}/telemetry", listener.local_addr()?);
    info!("Press Ctrl+C to exit");

    tokio::select! {
        result = axum::serve(listener, app).into_future() => {
            result.context("server stopped unexpectedly")?;
        }

        // Handle Ctrl+C for graceful shutdown
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    sampler_task.abort();

    if let Some((mut archive, stop_tx, handle)) = recorder {
        let _ = stop_tx.send(());
        let mut session = handle.await?;
        session.save_flight(&mut archive)?;
    }

    Ok(())
}
