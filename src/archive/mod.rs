//! # Flight Archive
//!
//! Saved flights, persisted as a single JSON array under one storage key.
//!
//! The archive is loaded lazily on first access. Missing or corrupt data
//! yields an empty archive. A store read error is never cached: listing
//! shows nothing, and mutations retry the read and fail rather than write
//! over history they could not see. Every mutation writes the full
//! collection back before returning, and the in-memory copy only changes
//! once that write has succeeded.

pub mod store;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TelemetryError};
use crate::geo::{total_distance, Waypoint};

pub use store::{FileStore, KeyValueStore, MemoryStore};

/// Storage key holding the serialized archive.
pub const FLIGHT_HISTORY_KEY: &str = "flightHistory";

/// Format of [`FlightRecord::date`].
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A saved flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    /// Creation time in milliseconds since the Unix epoch, unique within an archive.
    pub id: i64,
    /// Human readable creation time.
    pub date: String,
    /// Great-circle length of `points` in meters, fixed at save time.
    pub distance: f64,
    pub points: Vec<Waypoint>,
}

impl FlightRecord {
    /// Build a record for `points` created at `created`.
    pub fn new<Tz: TimeZone>(id: i64, created: &DateTime<Tz>, points: Vec<Waypoint>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            id,
            date: created.format(DATE_FORMAT).to_string(),
            distance: total_distance(&points),
            points,
        }
    }
}

/// Ordered collection of [`FlightRecord`]s on top of a [`KeyValueStore`].
#[derive(Debug)]
pub struct FlightArchive<S> {
    store: S,
    flights: Option<Vec<FlightRecord>>,
}

impl<S: KeyValueStore> FlightArchive<S> {
    pub fn new(store: S) -> Self {
        Self { store, flights: None }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn load(&self) -> Result<Vec<FlightRecord>> {
        let Some(raw) = self.store.get(FLIGHT_HISTORY_KEY)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(flights) => Ok(flights),
            Err(e) => {
                warn!("Flight history is corrupt, starting empty: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// The cached flights, reading the store first if that has not succeeded yet.
    fn loaded(&mut self) -> Result<&Vec<FlightRecord>> {
        if self.flights.is_none() {
            self.flights = Some(self.load()?);
        }
        Ok(self.flights.get_or_insert_with(Vec::new))
    }

    fn persist(&mut self, flights: Vec<FlightRecord>) -> Result<()> {
        let json = serde_json::to_string(&flights)?;
        self.store.set(FLIGHT_HISTORY_KEY, &json)?;
        self.flights = Some(flights);
        Ok(())
    }

    /// All saved flights, oldest first.
    ///
    /// Empty while the store cannot be read; the next call reads it again.
    pub fn list(&mut self) -> &[FlightRecord] {
        match self.loaded() {
            Ok(flights) => flights.as_slice(),
            Err(e) => {
                warn!("Could not read flight history: {}", e);
                &[]
            }
        }
    }

    pub fn get(&mut self, id: i64) -> Option<&FlightRecord> {
        self.list().iter().find(|flight| flight.id == id)
    }

    /// Append `record` and persist.
    ///
    /// # Errors
    ///
    /// Fails if the existing history cannot be read, a flight with the same
    /// id already exists, or the store rejects the write.
    pub fn append(&mut self, record: FlightRecord) -> Result<()> {
        let mut flights = self.loaded()?.clone();
        if flights.iter().any(|flight| flight.id == record.id) {
            return Err(TelemetryError::Storage(format!("flight {} already exists", record.id)));
        }

        flights.push(record);
        self.persist(flights)
    }

    /// Remove the flight with `id` and persist.
    ///
    /// Returns `false` without writing anything if no such flight exists.
    pub fn delete(&mut self, id: i64) -> Result<bool> {
        let flights = self.loaded()?;
        if !flights.iter().any(|flight| flight.id == id) {
            return Ok(false);
        }

        let remaining = flights.iter().filter(|flight| flight.id != id).cloned().collect();
        self.persist(remaining)?;

        info!("Deleted flight {}", id);
        Ok(true)
    }

    /// Save `points` as a new flight created now.
    pub fn record_flight(&mut self, points: Vec<Waypoint>) -> Result<FlightRecord> {
        self.record_flight_at(points, &Local::now())
    }

    /// Save `points` as a new flight created at `created`.
    ///
    /// The id is the creation time in milliseconds, bumped past the newest
    /// existing id when the clock has not moved on.
    pub fn record_flight_at<Tz: TimeZone>(
        &mut self,
        points: Vec<Waypoint>,
        created: &DateTime<Tz>,
    ) -> Result<FlightRecord>
    where
        Tz::Offset: std::fmt::Display,
    {
        let candidate = created.timestamp_millis();
        let id = match self.loaded()?.iter().map(|flight| flight.id).max() {
            Some(newest) if newest >= candidate => newest + 1,
            _ => candidate,
        };

        let record = FlightRecord::new(id, created, points);
        self.append(record.clone())?;

        info!(
            "Saved flight {} ({} points, {:.2} m)",
            record.id,
            record.points.len(),
            record.distance
        );
        Ok(record)
    }
}
