//! First and last mile.
//!
//! Walking times from the query origin to every station and from every
//! station to the destination come from the travel-time provider in
//! batches. Reachable stations get a footpath connection from the
//! synthetic origin; stations near the destination get a walking hint.

use std::collections::HashMap;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::domain::{Coordinate, DayTime, StationId, TripKind};
use crate::timetable::{TimetableError, TimetableScope};
use crate::travel::{TravelMode, TravelTimeProvider};

/// Travel times from one point to many, batched to `batch` targets per
/// request.
///
/// A batch whose request fails is logged and left unreachable.
pub(super) async fn one_to_many<P: TravelTimeProvider>(
    provider: &P,
    source: Coordinate,
    targets: &[Coordinate],
    mode: TravelMode,
    batch: usize,
) -> Vec<Option<u32>> {
    let futures: Vec<_> = targets
        .chunks(batch.max(1))
        .map(|chunk| async move {
            let result = provider.matrix(&[source], chunk, mode).await;
            (chunk.len(), result)
        })
        .collect();

    let mut times = Vec::with_capacity(targets.len());
    for (len, result) in join_all(futures).await {
        match result {
            Ok(matrix) => {
                let row = matrix.into_iter().next().unwrap_or_default();
                times.extend((0..len).map(|j| row.get(j).copied().flatten().map(|c| c.time_secs)));
            }
            Err(e) => {
                warn!(?mode, targets = len, error = %e, "matrix request failed, treating batch as unreachable");
                times.extend(std::iter::repeat_n(None, len));
            }
        }
    }
    times
}

/// Travel times from many points to one, batched to `batch` sources per
/// request.
///
/// A batch whose request fails is logged and left unreachable.
pub(super) async fn many_to_one<P: TravelTimeProvider>(
    provider: &P,
    sources: &[Coordinate],
    target: Coordinate,
    mode: TravelMode,
    batch: usize,
) -> Vec<Option<u32>> {
    let futures: Vec<_> = sources
        .chunks(batch.max(1))
        .map(|chunk| async move {
            let result = provider.matrix(chunk, &[target], mode).await;
            (chunk.len(), result)
        })
        .collect();

    let mut times = Vec::with_capacity(sources.len());
    for (len, result) in join_all(futures).await {
        match result {
            Ok(matrix) => {
                times.extend((0..len).map(|i| {
                    matrix
                        .get(i)
                        .and_then(|row| row.first().copied().flatten())
                        .map(|c| c.time_secs)
                }));
            }
            Err(e) => {
                warn!(?mode, sources = len, error = %e, "matrix request failed, treating batch as unreachable");
                times.extend(std::iter::repeat_n(None, len));
            }
        }
    }
    times
}

/// Pairs each station with its time, keeping those within `max_secs`.
pub(super) fn within_cap(
    stations: &[StationId],
    times: &[Option<u32>],
    max_secs: u32,
) -> Vec<(StationId, u32)> {
    stations
        .iter()
        .zip(times)
        .filter_map(|(id, t)| t.filter(|secs| *secs <= max_secs).map(|secs| (*id, secs)))
        .collect()
}

/// Adds one footpath from `origin` to every reachable station.
///
/// Each footpath gets its own trip. Returns the number inserted.
pub(super) fn insert_access(
    scope: &mut TimetableScope<'_>,
    origin: StationId,
    departure: DayTime,
    mut reachable: Vec<(StationId, u32)>,
) -> Result<usize, TimetableError> {
    reachable.sort_by_key(|(id, secs)| (*secs, *id));

    for (station, secs) in &reachable {
        scope.add_synthetic_connection(TripKind::Footpath, origin, *station, departure, *secs)?;
    }

    debug!(%origin, footpaths = reachable.len(), "access footpaths added");
    Ok(reachable.len())
}

/// Walking hints towards the destination.
pub(super) fn egress_hints(reachable: Vec<(StationId, u32)>) -> HashMap<StationId, u32> {
    reachable.into_iter().collect()
}
