//! # Session Module
//!
//! Observer-side view of the telemetry stream.
//!
//! A [`SessionAggregator`] keeps the latest sample for display and the route
//! flown so far, and turns that route into a saved flight on request.
//! [`record_until`] feeds an aggregator from a hub subscription.

use tokio::sync::oneshot;
use tracing::debug;

use crate::archive::{FlightArchive, FlightRecord, KeyValueStore};
use crate::error::Result;
use crate::geo::{total_distance, Waypoint};
use crate::telemetry::{Subscription, TelemetrySample};

/// Per-observer accumulation of received samples.
///
/// # Examples
///
/// ```
/// use drone_telemetry::archive::{FlightArchive, MemoryStore};
/// use drone_telemetry::session::SessionAggregator;
///
/// let mut session = SessionAggregator::new();
/// let mut archive = FlightArchive::new(MemoryStore::new());
///
/// let flight = session.save_flight(&mut archive)?;
/// assert_eq!(flight.distance, 0.0);
/// assert!(session.route().is_empty());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionAggregator {
    last_sample: Option<TelemetrySample>,
    route: Vec<Waypoint>,
}

impl SessionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a received sample.
    pub fn on_sample(&mut self, sample: &TelemetrySample) {
        self.route.push(sample.gps);
        self.last_sample = Some(sample.clone());
    }

    /// Clear the session route. The latest sample is kept.
    pub fn reset(&mut self) {
        self.route.clear();
    }

    /// Great-circle length of the session route in meters.
    pub fn distance(&self) -> f64 {
        total_distance(&self.route)
    }

    pub fn route(&self) -> &[Waypoint] {
        &self.route
    }

    pub fn last_sample(&self) -> Option<&TelemetrySample> {
        self.last_sample.as_ref()
    }

    /// Save the current route to `archive` and start a new route.
    ///
    /// On error the route is left untouched.
    pub fn save_flight<S: KeyValueStore>(&mut self, archive: &mut FlightArchive<S>) -> Result<FlightRecord> {
        let record = archive.record_flight(self.route.clone())?;
        self.reset();
        Ok(record)
    }
}

/// Feed samples from `subscription` into a new session until `stop` fires
/// or the subscription ends.
pub async fn record_until(mut subscription: Subscription, mut stop: oneshot::Receiver<()>) -> SessionAggregator {
    let mut session = SessionAggregator::new();

    loop {
        tokio::select! {
            sample = subscription.recv() => match sample {
                Some(sample) => {
                    session.on_sample(&sample);
                    debug!("Recorded point {} ({:.2} m so far)", session.route().len(), session.distance());
                }
                None => break,
            },
            _ = &mut stop => break,
        }
    }

    session
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::MemoryStore;
    use crate::telemetry::DistributionHub;
    use crate::weather::WeatherReading;
    use std::time::Duration;

    fn sample_at(lat: f64, lng: f64, battery: u8) -> TelemetrySample {
        TelemetrySample {
            gps: Waypoint::new(lat, lng),
            battery,
            altitude: 52.0,
            speed: 6.5,
            weather: WeatherReading::unknown(),
        }
    }

    #[test]
    fn test_on_sample_appends_and_tracks_latest() {
        let mut session = SessionAggregator::new();
        assert!(session.last_sample().is_none());

        session.on_sample(&sample_at(51.0501, -114.0719, 27));
        session.on_sample(&sample_at(51.0510, -114.0700, 26));

        assert_eq!(session.route().len(), 2);
        assert_eq!(session.route()[1], Waypoint::new(51.0510, -114.0700));
        assert_eq!(session.last_sample().unwrap().battery, 26);
    }

    #[test]
    fn test_reset_keeps_latest_sample() {
        let mut session = SessionAggregator::new();
        session.on_sample(&sample_at(51.0501, -114.0719, 27));
        session.reset();

        assert!(session.route().is_empty());
        assert_eq!(session.distance(), 0.0);
        assert_eq!(session.last_sample().unwrap().battery, 27);
    }

    #[test]
    fn test_distance_matches_route() {
        let mut session = SessionAggregator::new();
        session.on_sample(&sample_at(51.0501, -114.0719, 27));
        assert_eq!(session.distance(), 0.0);

        session.on_sample(&sample_at(51.0510, -114.0700, 26));
        session.on_sample(&sample_at(51.0510, -114.0700, 25));
        assert_eq!(session.distance(), total_distance(session.route()));
        assert!(session.distance() > 0.0);
    }

    #[test]
    fn test_save_flight_snapshots_and_resets() {
        let mut session = SessionAggregator::new();
        let mut archive = FlightArchive::new(MemoryStore::new());
        session.on_sample(&sample_at(51.0501, -114.0719, 27));
        session.on_sample(&sample_at(51.0510, -114.0700, 26));
        let expected_route = session.route().to_vec();
        let expected_distance = session.distance();

        let record = session.save_flight(&mut archive).unwrap();

        assert_eq!(record.points, expected_route);
        assert_eq!(record.distance, expected_distance);
        assert_eq!(record.distance, total_distance(&record.points));
        assert!(session.route().is_empty());
        assert_eq!(archive.list(), &[record]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_until_stop() {
        let hub = DistributionHub::new();
        let subscription = hub.join();
        let (stop_tx, stop_rx) = oneshot::channel();

        hub.publish(sample_at(51.0501, -114.0719, 27));
        hub.publish(sample_at(51.0510, -114.0700, 26));

        let recorder = tokio::spawn(record_until(subscription, stop_rx));
        // The paused clock only moves once the recorder is idle, i.e. drained
        tokio::time::sleep(Duration::from_millis(10)).await;
        stop_tx.send(()).unwrap();

        let session = recorder.await.unwrap();
        assert_eq!(session.route().len(), 2);
        assert_eq!(session.last_sample().unwrap().battery, 26);

        // Samples published after the stop are not recorded
        assert_eq!(hub.publish(sample_at(51.0525, -114.0690, 25)), 0);
    }

    #[tokio::test]
    async fn test_record_until_subscription_ends() {
        let hub = DistributionHub::new();
        let subscription = hub.join();
        let id = subscription.id();
        let (_stop_tx, stop_rx) = oneshot::channel();

        hub.publish(sample_at(51.0501, -114.0719, 27));
        hub.publish(sample_at(51.0510, -114.0700, 26));
        hub.leave(id);

        let session = record_until(subscription, stop_rx).await;
        assert_eq!(session.route().len(), 2);
        assert_eq!(session.last_sample().unwrap().battery, 26);
    }
}
