//! Ordering and deduplication of search results.

use crate::domain::Journey;

/// Rank journeys by preference.
///
/// Journeys are ranked by:
/// 1. Number of transfers (fewer is better)
/// 2. Arrival time (earlier is better)
/// 3. Total duration (shorter is better)
///
/// Candidates come out of the search one per round with improving arrival,
/// so this mostly keeps search order while putting walk-only and car
/// journeys where their transfer count belongs.
pub fn rank_journeys(mut journeys: Vec<Journey>) -> Vec<Journey> {
    journeys.sort_by(|a, b| {
        a.transfer_count()
            .cmp(&b.transfer_count())
            .then_with(|| a.arrival_time().cmp(&b.arrival_time()))
            .then_with(|| a.duration_secs().cmp(&b.duration_secs()))
    });

    journeys
}

/// Drop journeys identical to the one before them.
///
/// Two rounds can yield the same sequence of connections once the initial
/// walk has been shifted; only the first is kept.
pub fn deduplicate(journeys: Vec<Journey>) -> Vec<Journey> {
    let mut result: Vec<Journey> = Vec::with_capacity(journeys.len());

    for journey in journeys {
        if result.last() != Some(&journey) {
            result.push(journey);
        }
    }

    result
}
