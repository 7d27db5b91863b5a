//! Station and coordinate types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a station within a timetable.
///
/// Persistent stations get dense ids `0..n` at load time; synthetic
/// stations created for a query get ids above that range from the
/// timetable's counter.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(pub u32);

impl StationId {
    /// Returns the id as a vector index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationId({})", self.0)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A WGS84 longitude/latitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    /// Create a new coordinate.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Returns true if both components are finite and within WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }

    /// Converts to a `geo` point (x = lon, y = lat).
    pub fn to_point(&self) -> geo::Point<f64> {
        geo::Point::new(self.lon, self.lat)
    }
}

/// Whether a station came from the feed or was created for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationKind {
    /// Loaded from the feed snapshot.
    Persistent,
    /// Created at query time for an arbitrary coordinate.
    Synthetic,
}

/// A physical (or synthetic) location where connections start and end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Timetable id.
    pub id: StationId,
    /// Feed code (e.g. GTFS `stop_id`); synthetic stations use their name.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Location.
    pub location: Coordinate,
    /// Lifecycle.
    pub kind: StationKind,
}

impl Station {
    /// Returns the station's longitude.
    pub fn lon(&self) -> f64 {
        self.location.lon
    }

    /// Returns the station's latitude.
    pub fn lat(&self) -> f64 {
        self.location.lat
    }

    /// Returns true for stations created for a single query.
    pub fn is_synthetic(&self) -> bool {
        self.kind == StationKind::Synthetic
    }
}
