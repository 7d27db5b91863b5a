//! Bucketed proximity index over stations.
//!
//! Longitudes are projected to metres and cut into fixed-width buckets;
//! each bucket is sorted by latitude. A radius query scans the buckets that
//! can overlap the radius and, inside each, walks out from the query
//! latitude until stations get too far.
//!
//! Distances are planar with both axes scaled by the same factor, so results
//! are approximate: every station within `radius` is returned, along with
//! possibly a few up to `radius + bucket width` away.

use crate::domain::{Coordinate, Station};

/// Metres per degree used for projection.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Default bucket width in metres.
pub const DEFAULT_BUCKET_WIDTH_M: f64 = 100.0;

/// Projects a coordinate component in degrees to metres.
pub fn degrees_to_meters(degrees: f64) -> f64 {
    degrees * METERS_PER_DEGREE
}

/// Planar distance in metres between two coordinates, using
/// [`degrees_to_meters`] on both axes.
pub fn planar_distance_m(a: Coordinate, b: Coordinate) -> f64 {
    let dx = degrees_to_meters(a.lon) - degrees_to_meters(b.lon);
    let dy = degrees_to_meters(a.lat) - degrees_to_meters(b.lat);
    (dx * dx + dy * dy).sqrt()
}

/// A column of stations whose projected x falls in `[start, start + width)`.
#[derive(Debug, Clone)]
struct Bucket {
    start: f64,
    /// Sorted by latitude.
    stations: Vec<Station>,
}

/// Radius-bounded nearest-neighbour index over a fixed station set.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    buckets: Vec<Bucket>,
    width: f64,
    len: usize,
}

impl SpatialIndex {
    /// Builds an index with buckets `bucket_width_m` metres wide.
    pub fn new(stations: impl IntoIterator<Item = Station>, bucket_width_m: f64) -> Self {
        let width = if bucket_width_m > 0.0 {
            bucket_width_m
        } else {
            DEFAULT_BUCKET_WIDTH_M
        };

        let mut sorted: Vec<Station> = stations.into_iter().collect();
        sorted.sort_by(|a, b| a.lon().total_cmp(&b.lon()));
        let len = sorted.len();

        let mut buckets: Vec<Bucket> = Vec::new();
        for station in sorted {
            let start = bucket_start(degrees_to_meters(station.lon()), width);
            match buckets.last_mut() {
                Some(bucket) if bucket.start == start => bucket.stations.push(station),
                _ => buckets.push(Bucket {
                    start,
                    stations: vec![station],
                }),
            }
        }
        for bucket in &mut buckets {
            bucket.stations.sort_by(|a, b| a.lat().total_cmp(&b.lat()));
        }

        Self {
            buckets,
            width,
            len,
        }
    }

    /// Builds an index with the default 100 m buckets.
    pub fn with_default_width(stations: impl IntoIterator<Item = Station>) -> Self {
        Self::new(stations, DEFAULT_BUCKET_WIDTH_M)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bucket_width(&self) -> f64 {
        self.width
    }

    /// Stations around `point` within `radius_m` (plus up to one bucket
    /// width of false positives).
    pub fn nearby(&self, point: Coordinate, radius_m: f64) -> Vec<&Station> {
        let mut results = Vec::new();
        if self.buckets.is_empty() {
            return results;
        }

        let qx = degrees_to_meters(point.lon);
        let bound = radius_m.max(0.0) + self.width;

        // Last bucket whose start is at or left of the point
        let home = self
            .buckets
            .partition_point(|b| b.start <= qx)
            .saturating_sub(1);
        let reach = (radius_m.max(0.0) / self.width).ceil() as usize;
        let span = reach.saturating_add(1);
        let first = home.saturating_sub(span);
        let last = home.saturating_add(span).min(self.buckets.len());

        for bucket in &self.buckets[first..last] {
            let stations = &bucket.stations;
            let pivot = stations.partition_point(|s| s.lat() < point.lat);

            for station in &stations[pivot..] {
                if planar_distance_m(point, station.location) > bound {
                    break;
                }
                results.push(station);
            }
            for station in stations[..pivot].iter().rev() {
                if planar_distance_m(point, station.location) > bound {
                    break;
                }
                results.push(station);
            }
        }

        results
    }

    /// Stations around an indexed station, including the station itself.
    pub fn nearby_station(&self, station: &Station, radius_m: f64) -> Vec<&Station> {
        self.nearby(station.location, radius_m)
    }
}

fn bucket_start(x: f64, width: f64) -> f64 {
    (x / width).floor() * width
}
