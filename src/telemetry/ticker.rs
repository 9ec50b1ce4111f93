//! Tick scheduling for the sampler.
//!
//! Production code drives the sampler from an [`IntervalTicker`]; tests use a
//! [`ManualTicker`] and fire ticks explicitly through its [`TickTrigger`].

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{self, Duration, Instant, Interval, MissedTickBehavior};

/// Source of sampler ticks.
#[async_trait]
pub trait Ticker: Send {
    /// Wait for the next tick.
    ///
    /// Returns `false` once the ticker can never fire again.
    async fn tick(&mut self) -> bool;
}

/// Fixed-period ticker backed by [`tokio::time::Interval`].
///
/// The first tick fires one full period after creation. Late ticks are
/// skipped rather than replayed.
#[derive(Debug)]
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

/// Ticker that fires only when its [`TickTrigger`] says so.
#[derive(Debug)]
pub struct ManualTicker {
    fires: mpsc::UnboundedReceiver<()>,
}

/// Handle used to fire a [`ManualTicker`]. Dropping every trigger stops the ticker.
#[derive(Debug, Clone)]
pub struct TickTrigger {
    fires: mpsc::UnboundedSender<()>,
}

impl TickTrigger {
    /// Queue one tick. Returns `false` if the ticker is gone.
    pub fn fire(&self) -> bool {
        self.fires.send(()).is_ok()
    }
}

/// Create a manual ticker and its trigger.
pub fn manual_ticker() -> (ManualTicker, TickTrigger) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ManualTicker { fires: rx }, TickTrigger { fires: tx })
}

#[async_trait]
impl Ticker for ManualTicker {
    async fn tick(&mut self) -> bool {
        self.fires.recv().await.is_some()
    }
}
