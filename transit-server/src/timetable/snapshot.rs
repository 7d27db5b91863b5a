//! Feed snapshot records.
//!
//! The snapshot is the JSON artefact produced by feed ingestion. It is
//! trusted apart from the handful of reference and ordering checks done in
//! [`Timetable::from_snapshot`](super::Timetable::from_snapshot).

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::SnapshotError;
use crate::domain::{DayTime, Route};

/// A whole feed, as written by ingestion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedSnapshot {
    #[serde(default)]
    pub routes: Vec<Route>,
    pub stations: Vec<StationRecord>,
    pub trips: Vec<TripRecord>,
}

/// A stop in the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationRecord {
    pub id: String,
    pub name: String,
    pub lon: f64,
    pub lat: f64,
}

/// A trip with its ordered stop times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRecord {
    pub id: String,
    #[serde(default)]
    pub route: Option<String>,
    pub stop_times: Vec<StopTimeRecord>,
}

/// One call of a trip at a station.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopTimeRecord {
    pub station: String,
    pub arrival: DayTime,
    pub departure: DayTime,
}

impl FeedSnapshot {
    /// Parse a snapshot from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a snapshot file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}
