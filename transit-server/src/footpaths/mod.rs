//! Walking footpaths between nearby stations.
//!
//! Precomputed offline by [`build_station_footpaths`] and stored as a JSON
//! table keyed by station code, so walking transfers don't need the
//! routing engine at query time. The table is rebuilt whenever the feed is
//! ingested; saving always overwrites.

mod build;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use build::{FootpathConfig, build_station_footpaths};

/// Errors reading or writing a footpath table.
#[derive(Debug, thiserror::Error)]
pub enum FootpathError {
    /// File access failed
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid footpath table
    #[error("invalid footpath JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A walk from one station to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footpath {
    /// Code of the station walked to.
    pub station: String,
    pub distance_m: f64,
    pub time_secs: u32,
}

/// Footpaths from every processed station, sorted by walking time.
///
/// Stations that were processed but have nothing within reach map to an
/// empty list, which tells them apart from stations never processed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FootpathTable {
    paths: BTreeMap<String, Vec<Footpath>>,
}

impl FootpathTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the footpaths from `station`, replacing any previous ones.
    ///
    /// The list is sorted by walking time.
    pub fn insert(&mut self, station: impl Into<String>, mut paths: Vec<Footpath>) {
        paths.sort_by_key(|p| p.time_secs);
        self.paths.insert(station.into(), paths);
    }

    /// Footpaths from `station`, quickest first.
    pub fn walkable_from(&self, station: &str) -> &[Footpath] {
        self.paths.get(station).map(Vec::as_slice).unwrap_or_default()
    }

    /// Walking time between two stations, if there is a footpath.
    pub fn get(&self, from: &str, to: &str) -> Option<u32> {
        self.walkable_from(from)
            .iter()
            .find(|p| p.station == to)
            .map(|p| p.time_secs)
    }

    /// Returns true if `station` has been processed.
    pub fn contains(&self, station: &str) -> bool {
        self.paths.contains_key(station)
    }

    /// Number of processed stations.
    pub fn station_count(&self) -> usize {
        self.paths.len()
    }

    /// Total number of footpaths.
    pub fn len(&self) -> usize {
        self.paths.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the table as JSON, overwriting `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), FootpathError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| FootpathError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read a table written by [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FootpathError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| FootpathError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}
