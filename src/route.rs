//! # Route Table
//!
//! The fixed, ordered list of waypoints the simulated vehicle cycles through,
//! and the cursor that walks it.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{Result, TelemetryError};
use crate::geo::Waypoint;

/// Immutable, non-empty sequence of waypoints loaded once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteTable {
    points: Vec<Waypoint>,
}

impl RouteTable {
    /// Build a route table from waypoints.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Route`] if the list is empty or any waypoint
    /// is outside the valid coordinate ranges.
    pub fn new(points: Vec<Waypoint>) -> Result<Self> {
        if points.is_empty() {
            return Err(TelemetryError::Route("route must contain at least one waypoint".to_string()));
        }

        if let Some((index, point)) = points.iter().enumerate().find(|(_, p)| !p.is_valid()) {
            return Err(TelemetryError::Route(format!(
                "waypoint {} is out of range: ({}, {})",
                index, point.lat, point.lng
            )));
        }

        Ok(Self { points })
    }

    /// Load a route table from a JSON file holding an array of `{lat, lng}` objects.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use drone_telemetry::route::RouteTable;
    ///
    /// let route = RouteTable::load("data/route.json")?;
    /// println!("{} waypoints", route.len());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let points: Vec<Waypoint> = serde_json::from_str(&contents)
            .map_err(|e| TelemetryError::Route(format!("{}: {}", path.display(), e)))?;
        let route = Self::new(points)?;

        info!("Loaded route with {} waypoints from {}", route.len(), path.display());
        Ok(route)
    }

    /// Waypoint at `index`, wrapping around the end of the route.
    pub fn at(&self, index: usize) -> Waypoint {
        self.points[index % self.points.len()]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Waypoint] {
        &self.points
    }

    /// A fresh cursor positioned at the first waypoint.
    pub fn cursor(&self) -> RouteCursor {
        RouteCursor::new(self.points.len())
    }
}

/// Position in a route table plus a count of every advance ever made.
///
/// `position` wraps modulo the route length; `ticks` never wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteCursor {
    position: usize,
    ticks: u64,
    len: usize,
}

impl RouteCursor {
    fn new(len: usize) -> Self {
        Self {
            position: 0,
            ticks: 0,
            len: len.max(1),
        }
    }

    /// Current index into the route table, always `< len`.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of advances since the cursor was created.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn advance(&mut self) {
        self.position = (self.position + 1) % self.len;
        self.ticks += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample_route(len: usize) -> RouteTable {
        let points = (0..len)
            .map(|i| Waypoint::new(51.0 + i as f64 * 0.001, -114.0))
            .collect();
        RouteTable::new(points).unwrap()
    }

    #[test]
    fn test_empty_route_rejected() {
        assert!(matches!(RouteTable::new(vec![]), Err(TelemetryError::Route(_))));
    }

    #[test]
    fn test_out_of_range_waypoint_rejected() {
        let result = RouteTable::new(vec![Waypoint::new(0.0, 0.0), Waypoint::new(95.0, 0.0)]);
        match result {
            Err(TelemetryError::Route(msg)) => assert!(msg.contains("waypoint 1")),
            other => panic!("Expected Route error, got: {:?}", other),
        }
    }

    #[test]
    fn test_cursor_is_periodic() {
        for len in 1..=7 {
            let route = sample_route(len);
            let mut cursor = route.cursor();
            let mut seen = Vec::new();
            for _ in 0..len * 3 {
                assert!(cursor.position() < len);
                seen.push(cursor.position());
                cursor.advance();
            }
            for (i, position) in seen.iter().enumerate() {
                assert_eq!(*position, i % len);
            }
        }
    }

    #[test]
    fn test_cursor_ticks_keep_counting_after_wrap() {
        let route = sample_route(3);
        let mut cursor = route.cursor();
        for _ in 0..5 {
            cursor.advance();
        }
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.ticks(), 5);
    }

    #[test]
    fn test_at_wraps() {
        let route = sample_route(3);
        assert_eq!(route.at(3), route.at(0));
        assert_eq!(route.at(4), route.points()[1]);
    }

    #[test]
    fn test_load_route_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(br#"[{"lat": 51.0501, "lng": -114.0719}, {"lat": 51.0505, "lng": -114.0712}]"#)
            .unwrap();
        temp_file.flush().unwrap();

        let route = RouteTable::load(temp_file.path()).unwrap();
        assert_eq!(route.len(), 2);
        assert_eq!(route.at(1), Waypoint::new(51.0505, -114.0712));
    }

    #[test]
    fn test_load_malformed_route() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[{\"lat\": 51.0}]").unwrap();
        temp_file.flush().unwrap();

        assert!(matches!(RouteTable::load(temp_file.path()), Err(TelemetryError::Route(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = RouteTable::load("/nonexistent/route.json");
        assert!(matches!(result, Err(TelemetryError::Io(_))));
    }

    #[test]
    fn test_bundled_route_is_valid() {
        let route = RouteTable::load(concat!(env!("CARGO_MANIFEST_DIR"), "/data/route.json")).unwrap();
        assert!(route.len() > 1);
    }
}
