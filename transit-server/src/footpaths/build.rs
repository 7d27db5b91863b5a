//! Offline footpath computation.

use tracing::{debug, info, warn};

use crate::domain::{Coordinate, Station};
use crate::spatial::SpatialIndex;
use crate::travel::{TravelMode, TravelTimeProvider};

use super::{Footpath, FootpathTable};

/// Configuration for footpath precomputation.
#[derive(Debug, Clone)]
pub struct FootpathConfig {
    /// Radius around each station searched for neighbours (metres).
    pub radius_m: f64,

    /// Walks longer than this along the network are dropped (metres).
    pub max_distance_m: f64,

    /// The source batch is shrunk until it has at most this many stations.
    pub max_batch: usize,

    /// Shrinking stops once the batch radius is `radius_m / max_factor`.
    pub max_factor: u32,
}

impl Default for FootpathConfig {
    fn default() -> Self {
        Self {
            radius_m: 1000.0,
            max_distance_m: 1200.0,
            max_batch: 20,
            max_factor: 15,
        }
    }
}

impl FootpathConfig {
    /// Set the neighbour search radius.
    pub fn with_radius(mut self, metres: f64) -> Self {
        self.radius_m = metres;
        self
    }

    /// Set the maximum walking distance.
    pub fn with_max_distance(mut self, metres: f64) -> Self {
        self.max_distance_m = metres;
        self
    }
}

/// Computes walking footpaths between nearby stations.
///
/// Stations are processed in batches to save requests: for a station not
/// yet done, its close neighbours form the source batch and everything
/// within the radius plus the batch radius forms the targets, so every
/// source sees all of its own neighbours. The batch radius shrinks until
/// the batch is small enough.
///
/// A failed request leaves its batch unprocessed; those stations get
/// another chance when the loop reaches them.
pub async fn build_station_footpaths<P: TravelTimeProvider>(
    stations: &[Station],
    index: &SpatialIndex,
    provider: &P,
    config: &FootpathConfig,
) -> FootpathTable {
    let mut table = FootpathTable::new();
    let mut requests = 0;
    let mut failures = 0;

    for station in stations {
        if table.contains(&station.code) {
            continue;
        }

        let mut factor = 1;
        let mut batch = index.nearby_station(station, config.radius_m / factor as f64);
        while batch.len() > config.max_batch && factor < config.max_factor {
            factor += 1;
            batch = index.nearby_station(station, config.radius_m / factor as f64);
        }

        // Always include the station itself, drop anything already done
        let mut sources: Vec<&Station> = vec![station];
        sources.extend(
            batch
                .into_iter()
                .filter(|s| s.id != station.id && !table.contains(&s.code)),
        );

        let targets =
            index.nearby_station(station, config.radius_m + config.radius_m / factor as f64);

        let source_points: Vec<Coordinate> = sources.iter().map(|s| s.location).collect();
        let target_points: Vec<Coordinate> = targets.iter().map(|s| s.location).collect();

        requests += 1;
        let matrix = match provider
            .matrix(&source_points, &target_points, TravelMode::Walk)
            .await
        {
            Ok(m) => m,
            Err(e) => {
                failures += 1;
                warn!(station = %station.code, error = %e, "footpath matrix failed");
                continue;
            }
        };

        for (source, row) in sources.iter().zip(&matrix) {
            let paths: Vec<Footpath> = targets
                .iter()
                .zip(row)
                .filter_map(|(target, cell)| {
                    let cell = (*cell)?;
                    (target.id != source.id && cell.distance_m <= config.max_distance_m).then(
                        || Footpath {
                            station: target.code.clone(),
                            distance_m: cell.distance_m,
                            time_secs: cell.time_secs,
                        },
                    )
                })
                .collect();
            table.insert(source.code.clone(), paths);
        }

        debug!(
            station = %station.code,
            factor,
            sources = sources.len(),
            targets = targets.len(),
            "footpath batch done"
        );
    }

    info!(
        stations = table.station_count(),
        footpaths = table.len(),
        requests,
        failures,
        "footpaths built"
    );

    table
}
