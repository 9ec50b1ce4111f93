//! # Telemetry Sampler
//!
//! Produces one [`TelemetrySample`] per tick by walking the route table.
//!
//! A tick is split in two phases:
//!
//! 1. [`Sampler::begin_tick`] runs synchronously when the tick fires. It reads
//!    the current waypoint, synthesizes battery, altitude and speed, and
//!    advances the cursor.
//! 2. [`PendingSample::resolve`] awaits the weather lookup and assembles the
//!    sample.
//!
//! [`run_sampler`] spawns phase 2 for every tick, so a slow weather provider
//! never delays the timer. A single forwarder publishes the resolved samples
//! in tick order: a slow lookup holds back the ticks behind it instead of
//! letting them overtake.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::hub::DistributionHub;
use super::sample::{battery_level, TelemetrySample};
use super::ticker::Ticker;
use crate::geo::Waypoint;
use crate::route::{RouteCursor, RouteTable};
use crate::weather::{WeatherAdapter, WeatherProvider};

/// Minimum synthetic altitude in meters.
pub const ALTITUDE_BASE_M: f64 = 50.0;
/// Width of the uniform altitude band above [`ALTITUDE_BASE_M`].
pub const ALTITUDE_SPREAD_M: f64 = 10.0;
/// Minimum synthetic speed in m/s.
pub const SPEED_BASE_MS: f64 = 5.0;
/// Width of the uniform speed band above [`SPEED_BASE_MS`].
pub const SPEED_SPREAD_MS: f64 = 3.0;

/// Walks a [`RouteTable`] and builds telemetry samples.
pub struct Sampler<P> {
    route: RouteTable,
    cursor: RouteCursor,
    weather: Arc<WeatherAdapter<P>>,
    rng: StdRng,
}

/// A tick whose weather lookup has not completed yet.
pub struct PendingSample<P> {
    gps: Waypoint,
    battery: u8,
    altitude: f64,
    speed: f64,
    weather: Arc<WeatherAdapter<P>>,
}

impl<P: WeatherProvider> Sampler<P> {
    pub fn new(route: RouteTable, weather: WeatherAdapter<P>) -> Self {
        Self::with_rng(route, weather, StdRng::from_entropy())
    }

    /// Create a sampler with a caller-supplied random source.
    pub fn with_rng(route: RouteTable, weather: WeatherAdapter<P>, rng: StdRng) -> Self {
        let cursor = route.cursor();
        Self {
            route,
            cursor,
            weather: Arc::new(weather),
            rng,
        }
    }

    pub fn cursor(&self) -> &RouteCursor {
        &self.cursor
    }

    pub fn route(&self) -> &RouteTable {
        &self.route
    }

    /// Capture everything about this tick except the weather and advance the cursor.
    pub fn begin_tick(&mut self) -> PendingSample<P> {
        let gps = self.route.at(self.cursor.position());
        let battery = battery_level(self.cursor.ticks());
        let altitude = ALTITUDE_BASE_M + self.rng.gen::<f64>() * ALTITUDE_SPREAD_M;
        let speed = SPEED_BASE_MS + self.rng.gen::<f64>() * SPEED_SPREAD_MS;

        self.cursor.advance();

        PendingSample {
            gps,
            battery,
            altitude,
            speed,
            weather: Arc::clone(&self.weather),
        }
    }

    /// Run one complete tick, weather lookup included.
    pub async fn tick(&mut self) -> TelemetrySample {
        self.begin_tick().resolve().await
    }
}

impl<P: WeatherProvider> PendingSample<P> {
    pub fn gps(&self) -> Waypoint {
        self.gps
    }

    /// Fetch the weather for this tick's position and assemble the sample.
    pub async fn resolve(self) -> TelemetrySample {
        let weather = self.weather.fetch(&self.gps).await;

        TelemetrySample {
            gps: self.gps,
            battery: self.battery,
            altitude: self.altitude,
            speed: self.speed,
            weather,
        }
    }
}

/// Drive `sampler` from `ticker`, publishing every sample to `hub` in tick order.
///
/// Runs until the ticker stops; an [`IntervalTicker`](super::IntervalTicker)
/// never does. Samples still resolving at that point are published before
/// this returns.
pub async fn run_sampler<P, T>(mut sampler: Sampler<P>, mut ticker: T, hub: DistributionHub)
where
    P: WeatherProvider + 'static,
    T: Ticker,
{
    info!("Starting telemetry sampler over {} waypoints", sampler.route().len());

    let (resolving_tx, resolving_rx) = mpsc::unbounded_channel();
    let forwarder = tokio::spawn(publish_in_order(resolving_rx, hub));

    while ticker.tick().await {
        let pending = sampler.begin_tick();
        if resolving_tx.send(tokio::spawn(pending.resolve())).is_err() {
            warn!("Telemetry forwarder exited, stopping sampler");
            break;
        }
    }

    drop(resolving_tx);
    if let Err(e) = forwarder.await {
        warn!("Telemetry forwarder failed: {}", e);
    }

    info!("Telemetry sampler stopped after {} ticks", sampler.cursor().ticks());
}

/// Await each tick's lookup in the order the ticks fired and publish it.
async fn publish_in_order(
    mut resolving: mpsc::UnboundedReceiver<JoinHandle<TelemetrySample>>,
    hub: DistributionHub,
) {
    while let Some(handle) = resolving.recv().await {
        match handle.await {
            Ok(sample) => {
                let battery = sample.battery;
                let delivered = hub.publish(sample);
                debug!("Published telemetry (battery {}%) to {} observers", battery, delivered);
            }
            Err(e) => warn!("Telemetry sample lost: {}", e),
        }
    }
}
