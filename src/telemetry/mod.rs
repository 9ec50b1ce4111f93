//! # Telemetry Module
//!
//! Generates simulated vehicle telemetry and fans it out to observers.
//!
//! This module handles:
//! - The [`TelemetrySample`] data type and the synthetic battery model
//! - Walking the route table once per tick ([`Sampler`])
//! - Scheduling ticks ([`Ticker`], real interval or manual)
//! - Broadcasting samples to every connected observer ([`DistributionHub`])

pub mod hub;
pub mod sample;
pub mod sampler;
pub mod ticker;

pub use hub::{DistributionHub, ObserverId, Subscription};
pub use sample::{battery_level, TelemetrySample};
pub use sampler::{run_sampler, PendingSample, Sampler};
pub use ticker::{manual_ticker, IntervalTicker, ManualTicker, TickTrigger, Ticker};
