//! Timetable error types.

use std::path::PathBuf;

use crate::domain::{DayTime, StationId, TripId};

/// Errors from timetable lookups and query-scope insertions.
///
/// These indicate a bug in how synthetic edges were built, not bad user
/// input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimetableError {
    /// A scheduled trip has no registered connection sequence
    #[error("trip {0} not found")]
    TripNotFound(TripId),

    /// A connection is not part of the sequence of its own trip
    #[error("connection departing {departure} is not part of trip {trip}")]
    NotInTrip { trip: TripId, departure: DayTime },

    /// A connection references a station that does not exist
    #[error("station {0} not found")]
    UnknownStation(StationId),

    /// Insertion would break departure order of a station's list
    #[error("connection at {station} departing {departure} inserted after one departing {last}")]
    OutOfOrder {
        station: StationId,
        departure: DayTime,
        last: DayTime,
    },

    /// A connection arrives before it departs
    #[error("connection departing {departure} arrives earlier at {arrival}")]
    Inconsistent { departure: DayTime, arrival: DayTime },

    /// Every synthetic id has been handed out
    #[error("synthetic id space exhausted")]
    IdsExhausted,
}

/// Errors loading a feed snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Reading the snapshot file failed
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot is not valid JSON for the expected shape
    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Two stations share a feed code
    #[error("duplicate station code {0}")]
    DuplicateStation(String),

    /// A trip stops at a station missing from the snapshot
    #[error("trip {trip} references unknown station {station}")]
    UnknownStation { trip: String, station: String },

    /// A trip references a route missing from the snapshot
    #[error("trip {trip} references unknown route {route}")]
    UnknownRoute { trip: String, route: String },

    /// A trip needs two stops to form a connection
    #[error("trip {0} has fewer than two stops")]
    TooFewStops(String),

    /// Stop times within a trip go backwards
    #[error("trip {trip} goes back in time at stop {stop}")]
    TimeTravel { trip: String, stop: usize },
}
