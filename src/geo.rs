//! # Geographic Primitives
//!
//! Waypoints and great-circle distance.
//!
//! Distances are computed with the haversine formula on a spherical Earth of
//! radius [`EARTH_RADIUS_M`]. The intermediate `a` term is clamped to `[0, 1]`
//! so floating-point overshoot near antipodal or identical points never feeds
//! a negative value into `sqrt`.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A single geographic coordinate in decimal degrees.
///
/// # Examples
///
/// ```
/// use drone_telemetry::geo::Waypoint;
///
/// let calgary = Waypoint::new(51.0501, -114.0719);
/// assert_eq!(calgary.lat, 51.0501);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lng: f64,
}

impl Waypoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both components are finite and within the valid degree ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Great-circle distance between two waypoints in meters.
///
/// # Examples
///
/// ```
/// use drone_telemetry::geo::{haversine, Waypoint};
///
/// let a = Waypoint::new(51.0501, -114.0719);
/// assert_eq!(haversine(&a, &a), 0.0);
/// ```
pub fn haversine(from: &Waypoint, to: &Waypoint) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Cumulative length of a route in meters.
///
/// Routes with fewer than two points have length 0.
pub fn total_distance(route: &[Waypoint]) -> f64 {
    route
        .windows(2)
        .map(|pair| haversine(&pair[0], &pair[1]))
        .sum()
}
