//! Travel-time providers.
//!
//! The planner needs two things from a routing engine: time matrices
//! between points (walking for first/last mile, driving for car legs) and
//! isochrones (to prune candidate stations for car legs). The engine itself
//! is an external service; this module defines the boundary and ships:
//!
//! - [`ValhallaClient`], an HTTP client for a Valhalla-compatible service
//! - [`CachedProvider`], a moka cache in front of any provider
//! - [`StraightLineProvider`], a deterministic stand-in for tests and
//!   offline work

mod cache;
mod client;
mod error;
mod mock;
mod types;

use geo::{Contains, MultiPolygon};
use serde::{Deserialize, Serialize};

use crate::domain::Coordinate;

pub use cache::{CacheConfig, CachedProvider};
pub use client::{ValhallaClient, ValhallaConfig};
pub use error::TravelTimeError;
pub use mock::StraightLineProvider;
pub use types::{
    Contour, Feature, Geometry, IsochroneRequest, IsochroneResponse, Location, MatrixEntry,
    MatrixRequest, MatrixResponse,
};

/// How the traveller moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    Walk,
    Drive,
}

/// Travel time and distance for one source/target pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixCell {
    pub time_secs: u32,
    pub distance_m: f64,
}

/// `matrix[source][target]`; `None` where the target is unreachable.
pub type Matrix = Vec<Vec<Option<MatrixCell>>>;

/// The area reachable from a point within a time threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Isochrone {
    pub threshold_secs: u32,
    pub area: MultiPolygon<f64>,
}

impl Isochrone {
    /// Returns true if `point` lies inside the reachable area.
    pub fn contains(&self, point: Coordinate) -> bool {
        self.area.contains(&point.to_point())
    }
}

/// Trait for travel-time engines.
///
/// This abstraction allows the planner to be tested without a routing
/// service.
pub trait TravelTimeProvider: Send + Sync {
    /// Many-to-many time matrix, `sources.len()` rows by `targets.len()`
    /// columns.
    async fn matrix(
        &self,
        sources: &[Coordinate],
        targets: &[Coordinate],
        mode: TravelMode,
    ) -> Result<Matrix, TravelTimeError>;

    /// One isochrone per threshold, in the order the thresholds are given.
    async fn isochrone(
        &self,
        origin: Coordinate,
        thresholds_secs: &[u32],
        mode: TravelMode,
    ) -> Result<Vec<Isochrone>, TravelTimeError>;
}
