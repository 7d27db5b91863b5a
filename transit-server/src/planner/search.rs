//! Round-based earliest-arrival search.
//!
//! Each round extends the journeys of the previous one by exactly one more
//! trip, so the candidate found in round `r` uses `r + 1` rides. Rides may
//! be scheduled vehicles or the synthetic footpath and car connections of
//! the query scope.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, trace};

use crate::domain::{Connection, DayTime, StationId, TripId};
use crate::timetable::{TimetableError, TimetableScope};

/// The ride that produced a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ride {
    /// Connection where the trip was boarded.
    pub boarded: Connection,
    /// Connection whose arrival produced the label.
    pub alighted: Connection,
}

/// Earliest known arrival at a station in one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label {
    pub arrival: DayTime,
    /// `None` only for the origin seed.
    pub ride: Option<Ride>,
}

impl Label {
    fn seed(departure: DayTime) -> Self {
        Self {
            arrival: departure,
            ride: None,
        }
    }
}

/// Inputs of one search.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub origin: StationId,
    pub target: StationId,
    pub departure: DayTime,
    /// Number of rounds, i.e. the maximum number of rides.
    pub max_rounds: usize,
    /// Walking hints above this are ignored.
    pub max_walk_secs: u32,
    /// Frontier stations later than the bound plus this are skipped.
    pub slack_secs: u32,
}

/// The best way to finish found in one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundCandidate {
    /// Zero-based search round; the journey has `round + 1` rides.
    pub round: usize,
    /// Station the final ride alights at.
    pub station: StationId,
    /// Arrival at `station`.
    pub arrival: DayTime,
    /// Remaining walk to the target, zero if `station` is the target.
    pub walk_secs: u32,
    /// Arrival at the target.
    pub total: DayTime,
}

/// Labels of every round plus the per-round candidates.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// `rounds[0]` is the origin seed; search round `r` wrote `rounds[r + 1]`.
    pub rounds: Vec<BTreeMap<StationId, Label>>,
    /// At most one per round, with strictly improving totals.
    pub candidates: Vec<RoundCandidate>,
}

impl SearchOutcome {
    /// The label installed for `station` at `level`.
    pub fn label(&self, level: usize, station: StationId) -> Option<&Label> {
        self.rounds.get(level).and_then(|labels| labels.get(&station))
    }

    /// Number of search rounds that ran.
    pub fn rounds_run(&self) -> usize {
        self.rounds.len().saturating_sub(1)
    }
}

/// Multi-round scan over a timetable scope.
pub struct RouteSearch<'s, 'a> {
    scope: &'s TimetableScope<'a>,
    hints: &'s HashMap<StationId, u32>,
}

impl<'s, 'a> RouteSearch<'s, 'a> {
    /// `hints` maps stations to their walking time to the target.
    pub fn new(scope: &'s TimetableScope<'a>, hints: &'s HashMap<StationId, u32>) -> Self {
        Self { scope, hints }
    }

    /// Runs the search.
    ///
    /// Finding nothing is not an error; the outcome just has no candidates.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a connection's trip can't be followed, which means
    /// the scope was built inconsistently.
    pub fn run(&self, params: &SearchParams) -> Result<SearchOutcome, TimetableError> {
        let mut outcome = SearchOutcome {
            rounds: vec![BTreeMap::from([(
                params.origin,
                Label::seed(params.departure),
            )])],
            candidates: Vec::new(),
        };

        let mut best: HashMap<StationId, DayTime> = HashMap::from([(params.origin, params.departure)]);
        let mut scanned: HashSet<TripId> = HashSet::new();
        let mut frontier: BTreeMap<StationId, DayTime> =
            BTreeMap::from([(params.origin, params.departure)]);
        let mut bound = DayTime::MAX;

        for round in 0..params.max_rounds {
            if frontier.is_empty() {
                break;
            }

            let mut labels: BTreeMap<StationId, Label> = BTreeMap::new();
            let mut next: BTreeMap<StationId, DayTime> = BTreeMap::new();
            let cutoff = bound.saturating_add_secs(params.slack_secs);

            for (&station, &time) in &frontier {
                if time > cutoff {
                    trace!(%station, %time, "frontier station past bound");
                    continue;
                }

                for conn in self.scope.connections_from(station, time) {
                    if !scanned.insert(conn.trip_id) {
                        continue;
                    }

                    for hop in self.scope.follow_trip(conn, false)? {
                        if hop.arrival_time >= bound {
                            break;
                        }

                        let improves = best
                            .get(&hop.arrival_station)
                            .is_none_or(|known| hop.arrival_time < *known);
                        if improves {
                            best.insert(hop.arrival_station, hop.arrival_time);
                            labels.insert(
                                hop.arrival_station,
                                Label {
                                    arrival: hop.arrival_time,
                                    ride: Some(Ride {
                                        boarded: *conn,
                                        alighted: *hop,
                                    }),
                                },
                            );
                            next.insert(hop.arrival_station, hop.arrival_time);
                        }

                        if hop.arrival_station == params.target {
                            break;
                        }
                    }
                }
            }

            if let Some(candidate) = self.best_finish(round, &labels, params) {
                if candidate.total < bound {
                    bound = candidate.total;
                    outcome.candidates.push(candidate);
                }
            }

            debug!(
                round,
                frontier = frontier.len(),
                labelled = labels.len(),
                bound = %bound,
                "round complete"
            );

            outcome.rounds.push(labels);
            frontier = next;
        }

        Ok(outcome)
    }

    /// Cheapest way to reach the target from a station labelled this round.
    ///
    /// Ties keep the lowest station id.
    fn best_finish(
        &self,
        round: usize,
        labels: &BTreeMap<StationId, Label>,
        params: &SearchParams,
    ) -> Option<RoundCandidate> {
        let mut found: Option<RoundCandidate> = None;

        for (&station, label) in labels {
            let walk_secs = if station == params.target {
                0
            } else {
                match self.hints.get(&station) {
                    Some(&secs) if secs <= params.max_walk_secs => secs,
                    _ => continue,
                }
            };

            let total = label.arrival.saturating_add_secs(walk_secs);
            if found.is_none_or(|f| total < f.total) {
                found = Some(RoundCandidate {
                    round,
                    station,
                    arrival: label.arrival,
                    walk_secs,
                    total,
                });
            }
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TripKind;
    use crate::timetable::testing::TestFeed;

    fn time(s: &str) -> DayTime {
        DayTime::parse(s).unwrap()
    }

    fn params(origin: StationId, target: StationId, dep: &str, max_rounds: usize) -> SearchParams {
        SearchParams {
            origin,
            target,
            departure: time(dep),
            max_rounds,
            max_walk_secs: 900,
            slack_secs: 0,
        }
    }

    fn id(tt: &crate::timetable::Timetable, code: &str) -> StationId {
        tt.station_by_code(code).unwrap().id
    }

    #[test]
    fn direct_trip_found_in_first_round() {
        let tt = TestFeed::new()
            .station("A", 34.0, 32.0)
            .station("B", 34.1, 32.0)
            .trip("T1", None, &[("A", "10:00:00"), ("B", "10:20:00")])
            .build();
        let scope = tt.scope();
        let hints = HashMap::new();

        let outcome = RouteSearch::new(&scope, &hints)
            .run(&params(id(&tt, "A"), id(&tt, "B"), "09:55:00", 4))
            .unwrap();

        assert_eq!(outcome.candidates.len(), 1);
        let c = outcome.candidates[0];
        assert_eq!(c.round, 0);
        assert_eq!(c.station, id(&tt, "B"));
        assert_eq!(c.total, time("10:20:00"));
        assert_eq!(c.walk_secs, 0);
    }

    #[test]
    fn transfer_found_in_second_round() {
        let tt = TestFeed::new()
            .station("A", 34.0, 32.0)
            .station("M", 34.1, 32.0)
            .station("B", 34.2, 32.0)
            .trip("T1", None, &[("A", "10:00:00"), ("M", "10:10:00")])
            .trip("T2", None, &[("M", "10:15:00"), ("B", "10:30:00")])
            .build();
        let scope = tt.scope();
        let hints = HashMap::new();

        let outcome = RouteSearch::new(&scope, &hints)
            .run(&params(id(&tt, "A"), id(&tt, "B"), "09:55:00", 4))
            .unwrap();

        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].round, 1);
        assert_eq!(outcome.candidates[0].total, time("10:30:00"));

        let label = outcome.label(2, id(&tt, "B")).unwrap();
        let ride = label.ride.unwrap();
        assert_eq!(ride.boarded.departure_station, id(&tt, "M"));
    }

    #[test]
    fn single_round_misses_transfer() {
        let tt = TestFeed::new()
            .station("A", 34.0, 32.0)
            .station("M", 34.1, 32.0)
            .station("B", 34.2, 32.0)
            .trip("T1", None, &[("A", "10:00:00"), ("M", "10:10:00")])
            .trip("T2", None, &[("M", "10:15:00"), ("B", "10:30:00")])
            .build();
        let scope = tt.scope();
        let hints = HashMap::new();

        let outcome = RouteSearch::new(&scope, &hints)
            .run(&params(id(&tt, "A"), id(&tt, "B"), "09:55:00", 1))
            .unwrap();

        assert!(outcome.candidates.is_empty());
        assert_eq!(outcome.rounds_run(), 1);
    }

    #[test]
    fn nothing_in_window() {
        let tt = TestFeed::new()
            .station("A", 34.0, 32.0)
            .station("B", 34.1, 32.0)
            .trip("T1", None, &[("A", "08:00:00"), ("B", "08:20:00")])
            .build();
        let scope = tt.scope();
        let hints = HashMap::new();

        let outcome = RouteSearch::new(&scope, &hints)
            .run(&params(id(&tt, "A"), id(&tt, "B"), "09:55:00", 4))
            .unwrap();

        assert!(outcome.candidates.is_empty());
    }

    #[test]
    fn later_round_only_kept_when_better() {
        // Direct but slow, or change at M and arrive earlier
        let tt = TestFeed::new()
            .station("A", 34.0, 32.0)
            .station("M", 34.1, 32.0)
            .station("B", 34.2, 32.0)
            .trip("SLOW", None, &[("A", "10:00:00"), ("B", "11:00:00")])
            .trip("T1", None, &[("A", "10:01:00"), ("M", "10:10:00")])
            .trip("T2", None, &[("M", "10:15:00"), ("B", "10:30:00")])
            .trip("LATE", None, &[("M", "10:20:00"), ("B", "10:50:00")])
            .build();
        let scope = tt.scope();
        let hints = HashMap::new();

        let outcome = RouteSearch::new(&scope, &hints)
            .run(&params(id(&tt, "A"), id(&tt, "B"), "09:55:00", 4))
            .unwrap();

        let totals: Vec<_> = outcome.candidates.iter().map(|c| (c.round, c.total)).collect();
        assert_eq!(
            totals,
            vec![(0, time("11:00:00")), (1, time("10:30:00"))]
        );
    }

    #[test]
    fn walking_hint_finishes_journey() {
        let tt = TestFeed::new()
            .station("A", 34.0, 32.0)
            .station("B", 34.1, 32.0)
            .station("C", 34.2, 32.0)
            .trip("T1", None, &[("A", "10:00:00"), ("B", "10:10:00"), ("C", "10:30:00")])
            .build();
        let mut scope = tt.scope();
        let target = scope
            .add_synthetic_station(crate::domain::Coordinate::new(34.1, 32.01), "dest")
            .unwrap();
        // B is a short walk, C is too far
        let hints = HashMap::from([(id(&tt, "B"), 300), (id(&tt, "C"), 1200)]);

        let outcome = RouteSearch::new(&scope, &hints)
            .run(&params(id(&tt, "A"), target, "09:55:00", 4))
            .unwrap();

        assert_eq!(outcome.candidates.len(), 1);
        let c = outcome.candidates[0];
        assert_eq!(c.station, id(&tt, "B"));
        assert_eq!(c.walk_secs, 300);
        assert_eq!(c.total, time("10:15:00"));
    }

    #[test]
    fn synthetic_walks_are_each_followed() {
        let tt = TestFeed::new()
            .station("A", 34.0, 32.0)
            .station("B", 34.1, 32.0)
            .station("C", 34.2, 32.0)
            .build();
        let mut scope = tt.scope();
        let origin = scope
            .add_synthetic_station(crate::domain::Coordinate::new(34.05, 32.0), "origin")
            .unwrap();
        let target = scope
            .add_synthetic_station(crate::domain::Coordinate::new(34.3, 32.0), "dest")
            .unwrap();

        let mut trips = HashSet::new();
        for (code, secs) in [("A", 120), ("B", 240), ("C", 360)] {
            let conn = scope
                .add_synthetic_connection(TripKind::Footpath, origin, id(&tt, code), time("10:00:00"), secs)
                .unwrap();
            trips.insert(conn.trip_id);
        }
        assert_eq!(trips.len(), 3);

        let hints = HashMap::new();
        let outcome = RouteSearch::new(&scope, &hints)
            .run(&params(origin, target, "10:00:00", 2))
            .unwrap();

        // All three walks were followed in the first round
        let labelled: Vec<_> = outcome.rounds[1].keys().copied().collect();
        assert_eq!(labelled, vec![id(&tt, "A"), id(&tt, "B"), id(&tt, "C")]);
    }

    #[test]
    fn searches_are_idempotent() {
        let tt = TestFeed::new()
            .station("A", 34.0, 32.0)
            .station("M", 34.1, 32.0)
            .station("B", 34.2, 32.0)
            .trip("T1", None, &[("A", "10:00:00"), ("M", "10:10:00")])
            .trip("T2", None, &[("M", "10:15:00"), ("B", "10:30:00")])
            .build();
        let scope = tt.scope();
        let hints = HashMap::new();
        let search = RouteSearch::new(&scope, &hints);
        let p = params(id(&tt, "A"), id(&tt, "B"), "09:55:00", 4);

        let first = search.run(&p).unwrap();
        let second = search.run(&p).unwrap();
        assert_eq!(first.candidates, second.candidates);
        assert_eq!(first.rounds, second.rounds);
    }
}
