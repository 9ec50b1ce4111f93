//! # Export
//!
//! Data handed to the document renderers: pretty JSON mirroring routes and
//! flights verbatim, and a paginated plain-text flight report.

use crate::archive::FlightRecord;
use crate::error::Result;
use crate::geo::Waypoint;

/// Point lines per report page.
pub const DEFAULT_LINES_PER_PAGE: usize = 40;

/// Pretty JSON for an unsaved session route.
pub fn route_json(route: &[Waypoint]) -> Result<String> {
    Ok(serde_json::to_string_pretty(route)?)
}

/// Pretty JSON for a saved flight.
pub fn flight_json(flight: &FlightRecord) -> Result<String> {
    Ok(serde_json::to_string_pretty(flight)?)
}

/// Download name for an exported flight, e.g. `flight-1700000000000.pdf`.
pub fn export_file_name(id: i64, extension: &str) -> String {
    format!("flight-{}.{}", id, extension)
}

/// Paginated text report of a flight.
///
/// # Examples
///
/// ```
/// use drone_telemetry::export::FlightReport;
/// use drone_telemetry::geo::Waypoint;
///
/// let points = [Waypoint::new(51.05, -114.07)];
/// let report = FlightReport::new("2024-05-01 10:00:00", 0.0, &points);
/// let pages = report.pages();
/// assert_eq!(pages.len(), 1);
/// assert!(pages[0].contains("1. Lat: 51.05000, Lng: -114.07000"));
/// ```
#[derive(Debug, Clone)]
pub struct FlightReport<'a> {
    date: &'a str,
    distance: f64,
    points: &'a [Waypoint],
    lines_per_page: usize,
}

impl<'a> FlightReport<'a> {
    pub fn new(date: &'a str, distance: f64, points: &'a [Waypoint]) -> Self {
        Self {
            date,
            distance,
            points,
            lines_per_page: DEFAULT_LINES_PER_PAGE,
        }
    }

    pub fn for_flight(flight: &'a FlightRecord) -> Self {
        Self::new(&flight.date, flight.distance, &flight.points)
    }

    /// Change the number of point lines per page (at least one).
    pub fn with_lines_per_page(mut self, lines: usize) -> Self {
        self.lines_per_page = lines.max(1);
        self
    }

    fn header(&self) -> String {
        format!(
            "Flight Report\nDate: {}\nDistance: {:.2} m\n",
            self.date, self.distance
        )
    }

    /// Render the report, one string per page.
    pub fn pages(&self) -> Vec<String> {
        if self.points.is_empty() {
            return vec![format!("{}\nNo Data Available.\n", self.header())];
        }

        let total_pages = self.points.len().div_ceil(self.lines_per_page);

        self.points
            .chunks(self.lines_per_page)
            .enumerate()
            .map(|(page, chunk)| {
                let mut text = if page == 0 {
                    format!("{}\nGPS Points:\n", self.header())
                } else {
                    format!("Flight Report (page {} of {})\n\n", page + 1, total_pages)
                };

                for (offset, point) in chunk.iter().enumerate() {
                    let number = page * self.lines_per_page + offset + 1;
                    text.push_str(&format!(
                        "{}. Lat: {:.5}, Lng: {:.5}\n",
                        number, point.lat, point.lng
                    ));
                }
                text
            })
            .collect()
    }

    /// All pages joined with form feeds.
    pub fn render(&self) -> String {
        self.pages().join("\x0c")
    }
}
