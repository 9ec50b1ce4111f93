//! # Distribution Hub
//!
//! Explicit registry of connected observers and the `publish` operation that
//! pushes each sample to all of them.
//!
//! Every observer owns an unbounded queue, so a slow observer never blocks
//! publishing to the others. Samples are published under the registry lock,
//! which gives every observer the same sample order. Observers only see
//! samples published after they joined.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::sample::TelemetrySample;

/// Identifier assigned to an observer when it joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(u64);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer-{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    observers: BTreeMap<ObserverId, mpsc::UnboundedSender<Arc<TelemetrySample>>>,
}

/// Publish/subscribe broadcaster for telemetry samples.
///
/// Cloning is cheap; all clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct DistributionHub {
    registry: Arc<Mutex<Registry>>,
}

/// An observer's receiving end of the hub.
#[derive(Debug)]
pub struct Subscription {
    id: ObserverId,
    samples: mpsc::UnboundedReceiver<Arc<TelemetrySample>>,
}

impl Subscription {
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Wait for the next sample. Returns `None` once the observer has left the hub.
    pub async fn recv(&mut self) -> Option<Arc<TelemetrySample>> {
        self.samples.recv().await
    }

    /// Take a sample if one is already queued.
    pub fn try_recv(&mut self) -> Option<Arc<TelemetrySample>> {
        self.samples.try_recv().ok()
    }
}

impl DistributionHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new observer.
    pub fn join(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = self.registry();
        let id = ObserverId(registry.next_id);
        registry.next_id += 1;
        registry.observers.insert(id, tx);

        info!("{} connected ({} observers)", id, registry.observers.len());
        Subscription { id, samples: rx }
    }

    /// Remove an observer. Unknown ids are ignored.
    pub fn leave(&self, id: ObserverId) {
        let mut registry = self.registry();
        if registry.observers.remove(&id).is_some() {
            info!("{} disconnected ({} observers)", id, registry.observers.len());
        }
    }

    /// Send `sample` to every registered observer.
    ///
    /// Observers whose receiving end was dropped are removed. Returns the
    /// number of observers the sample was delivered to.
    pub fn publish(&self, sample: TelemetrySample) -> usize {
        let sample = Arc::new(sample);
        let mut registry = self.registry();

        registry.observers.retain(|id, tx| {
            if tx.send(Arc::clone(&sample)).is_ok() {
                true
            } else {
                debug!("Dropping {}: receiver closed", id);
                false
            }
        });

        registry.observers.len()
    }

    pub fn observer_count(&self) -> usize {
        self.registry().observers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Waypoint;
    use crate::weather::WeatherReading;

    fn sample(battery: u8) -> TelemetrySample {
        TelemetrySample {
            gps: Waypoint::new(51.0, -114.0),
            battery,
            altitude: 55.0,
            speed: 6.0,
            weather: WeatherReading::unknown(),
        }
    }

    #[test]
    fn test_publish_without_observers() {
        let hub = DistributionHub::new();
        assert_eq!(hub.publish(sample(27)), 0);
    }

    #[test]
    fn test_every_observer_receives_sample() {
        let hub = DistributionHub::new();
        let mut a = hub.join();
        let mut b = hub.join();
        assert_ne!(a.id(), b.id());

        assert_eq!(hub.publish(sample(27)), 2);
        assert_eq!(a.try_recv().unwrap().battery, 27);
        assert_eq!(b.try_recv().unwrap().battery, 27);
    }

    #[test]
    fn test_late_observer_gets_no_backfill() {
        let hub = DistributionHub::new();
        let mut early = hub.join();
        hub.publish(sample(27));

        let mut late = hub.join();
        assert!(late.try_recv().is_none());

        hub.publish(sample(26));
        assert_eq!(late.try_recv().unwrap().battery, 26);
        assert_eq!(early.try_recv().unwrap().battery, 27);
        assert_eq!(early.try_recv().unwrap().battery, 26);
    }

    #[test]
    fn test_order_is_preserved_per_observer() {
        let hub = DistributionHub::new();
        let mut a = hub.join();
        let mut b = hub.join();

        for battery in (20..=27).rev() {
            hub.publish(sample(battery));
        }

        let expected: Vec<u8> = (20..=27).rev().collect();
        let got_a: Vec<u8> = std::iter::from_fn(|| a.try_recv()).map(|s| s.battery).collect();
        let got_b: Vec<u8> = std::iter::from_fn(|| b.try_recv()).map(|s| s.battery).collect();
        assert_eq!(got_a, expected);
        assert_eq!(got_b, expected);
    }

    #[test]
    fn test_leave_removes_observer() {
        let hub = DistributionHub::new();
        let a = hub.join();
        let mut b = hub.join();
        hub.leave(a.id());
        hub.leave(a.id());

        assert_eq!(hub.observer_count(), 1);
        assert_eq!(hub.publish(sample(25)), 1);
        assert!(b.try_recv().is_some());
    }

    #[tokio::test]
    async fn test_recv_ends_after_leave() {
        let hub = DistributionHub::new();
        let mut subscription = hub.join();
        hub.publish(sample(27));
        hub.leave(subscription.id());

        assert!(subscription.recv().await.is_some());
        assert!(subscription.recv().await.is_none());
    }

    #[test]
    fn test_dropped_observer_does_not_affect_others() {
        let hub = DistributionHub::new();
        let dropped = hub.join();
        let mut alive = hub.join();
        drop(dropped);

        assert_eq!(hub.publish(sample(24)), 1);
        assert_eq!(hub.observer_count(), 1);
        assert_eq!(alive.try_recv().unwrap().battery, 24);
    }

    #[test]
    fn test_observer_id_display() {
        let hub = DistributionHub::new();
        let first = hub.join();
        assert_eq!(first.id().to_string(), "observer-0");
    }
}
