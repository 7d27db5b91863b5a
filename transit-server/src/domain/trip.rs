//! Trips and route metadata.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a trip within a timetable.
///
/// Footpath and car connections each get their own id, never a shared
/// constant, because the search scans every trip at most once.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripId(pub u32);

impl fmt::Debug for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TripId({})", self.0)
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index into the timetable's route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteId(pub u32);

/// What kind of movement a trip represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripKind {
    /// A scheduled vehicle run from the feed.
    Scheduled,
    /// A synthetic walking leg.
    Footpath,
    /// A synthetic car leg.
    Car,
}

impl TripKind {
    /// Returns true for trips created at query time.
    pub fn is_synthetic(self) -> bool {
        !matches!(self, TripKind::Scheduled)
    }
}

/// A vehicle run (or a synthetic leg).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub id: TripId,
    /// Feed code (GTFS `trip_id`), empty for synthetic trips.
    pub code: String,
    pub kind: TripKind,
    /// Route for scheduled trips.
    pub route: Option<RouteId>,
}

impl Trip {
    /// Create a synthetic trip of the given kind.
    pub fn synthetic(id: TripId, kind: TripKind) -> Self {
        Self {
            id,
            code: String::new(),
            kind,
            route: None,
        }
    }
}

/// Route metadata used only for display.
///
/// Kept out of `Trip` so the structs the search touches stay small.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Feed code (GTFS `route_id`).
    pub code: String,
    /// Line name shown to riders (e.g. "18").
    pub short_name: String,
    #[serde(default)]
    pub long_name: String,
    #[serde(default)]
    pub agency: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}
