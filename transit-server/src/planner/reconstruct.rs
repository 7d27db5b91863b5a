//! Turning search labels back into journeys.

use crate::domain::{
    Connection, DomainError, Journey, Leg, LegMode, Segment, StationId, TripKind, Walk,
};
use crate::timetable::{TimetableError, TimetableScope};

use super::error::PlanError;
use super::search::{RoundCandidate, SearchOutcome};

/// Builds the journey a candidate stands for.
///
/// Walks the labels back from the candidate's round to the origin seed,
/// one ride per level, then appends the walk to `target` if the last ride
/// doesn't end there.
pub fn reconstruct(
    scope: &TimetableScope<'_>,
    outcome: &SearchOutcome,
    candidate: &RoundCandidate,
    target: StationId,
) -> Result<Journey, PlanError> {
    let mut legs = Vec::with_capacity(candidate.round + 1);
    let mut station = candidate.station;

    for level in (1..=candidate.round + 1).rev() {
        let ride = outcome
            .label(level, station)
            .and_then(|label| label.ride)
            .ok_or(PlanError::MissingLabel { station, level })?;

        let prefix = scope.follow_trip(&ride.alighted, true)?;
        let start = prefix
            .iter()
            .rposition(|c| *c == ride.boarded)
            .ok_or(TimetableError::NotInTrip {
                trip: ride.boarded.trip_id,
                departure: ride.boarded.departure_time,
            })?;

        legs.push(make_leg(scope, prefix[start..].to_vec())?);
        station = ride.boarded.departure_station;
    }

    let mut segments: Vec<Segment> = legs.into_iter().rev().map(Segment::Trip).collect();

    if candidate.station != target {
        segments.push(Segment::Egress(Walk::new(
            candidate.station,
            target,
            candidate.arrival,
            candidate.walk_secs,
        )));
    }

    Ok(Journey::new(segments)?)
}

fn make_leg(
    scope: &TimetableScope<'_>,
    connections: Vec<Connection>,
) -> Result<Leg, PlanError> {
    let trip_id = connections
        .first()
        .map(|c| c.trip_id)
        .ok_or(DomainError::EmptyLeg)?;
    let kind = scope
        .trip(trip_id)
        .map(|t| t.kind)
        .ok_or(TimetableError::TripNotFound(trip_id))?;

    let mode = match kind {
        TripKind::Scheduled => LegMode::Transit,
        TripKind::Footpath => LegMode::Walk,
        TripKind::Car => LegMode::Car,
    };
    let line = scope.line_name(trip_id).map(str::to_string);

    Ok(Leg::new(mode, line, connections)?)
}

/// Starts the journey as late as possible.
///
/// An initial walk only has to reach the first vehicle in time, so it is
/// shifted to arrive exactly when the next ride departs. Car legs keep the
/// driver's departure time.
pub fn optimize_departure(journey: &mut Journey) {
    let segments = journey.segments_mut();
    let [Segment::Trip(first), Segment::Trip(next), ..] = segments else {
        return;
    };
    if first.mode() != LegMode::Walk {
        return;
    }

    let slack = next.departure_time().secs_since(first.arrival_time());
    if slack > 0 {
        first.delay_by(slack);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::domain::{Coordinate, DayTime};
    use crate::planner::search::{RouteSearch, SearchParams};
    use crate::timetable::testing::TestFeed;

    fn time(s: &str) -> DayTime {
        DayTime::parse(s).unwrap()
    }

    #[test]
    fn two_leg_journey_with_egress() {
        let tt = TestFeed::new()
            .station("A", 34.0, 32.0)
            .station("M", 34.1, 32.0)
            .station("B", 34.2, 32.0)
            .route("R1", "1")
            .route("R2", "2")
            .trip("T1", Some("R1"), &[("A", "10:00:00"), ("M", "10:10:00")])
            .trip("T2", Some("R2"), &[("M", "10:15:00"), ("B", "10:30:00")])
            .build();
        let a = tt.station_by_code("A").unwrap().id;
        let b = tt.station_by_code("B").unwrap().id;

        let mut scope = tt.scope();
        let dest = scope.add_synthetic_station(Coordinate::new(34.21, 32.0), "dest").unwrap();
        let hints = HashMap::from([(b, 240)]);
        let params = SearchParams {
            origin: a,
            target: dest,
            departure: time("09:55:00"),
            max_rounds: 4,
            max_walk_secs: 900,
            slack_secs: 0,
        };
        let outcome = RouteSearch::new(&scope, &hints).run(&params).unwrap();
        assert_eq!(outcome.candidates.len(), 1);

        let journey = reconstruct(&scope, &outcome, &outcome.candidates[0], dest).unwrap();
        assert_eq!(journey.origin(), a);
        assert_eq!(journey.destination(), dest);
        assert_eq!(journey.transfer_count(), 1);
        assert_eq!(journey.lines(), vec!["1", "2"]);
        assert_eq!(journey.departure_time(), time("10:00:00"));
        assert_eq!(journey.arrival_time(), time("10:34:00"));
        assert!(matches!(journey.segments().last(), Some(Segment::Egress(_))));
    }

    #[test]
    fn multi_stop_ride_is_one_leg() {
        let tt = TestFeed::new()
            .station("A", 34.0, 32.0)
            .station("B", 34.1, 32.0)
            .station("C", 34.2, 32.0)
            .station("D", 34.3, 32.0)
            .trip(
                "T1",
                None,
                &[("A", "10:00:00"), ("B", "10:05:00"), ("C", "10:10:00"), ("D", "10:15:00")],
            )
            .build();
        let b = tt.station_by_code("B").unwrap().id;
        let d = tt.station_by_code("D").unwrap().id;

        let scope = tt.scope();
        let hints = HashMap::new();
        let params = SearchParams {
            origin: b,
            target: d,
            departure: time("10:00:00"),
            max_rounds: 2,
            max_walk_secs: 900,
            slack_secs: 0,
        };
        let outcome = RouteSearch::new(&scope, &hints).run(&params).unwrap();
        let journey = reconstruct(&scope, &outcome, &outcome.candidates[0], d).unwrap();

        let leg = journey.legs().next().unwrap();
        assert_eq!(journey.segments().len(), 1);
        assert_eq!(leg.board_station(), b);
        assert_eq!(leg.hops(), 2);
        assert_eq!(leg.mode(), LegMode::Transit);
        assert_eq!(leg.line(), None);
    }

    #[test]
    fn initial_walk_shifted_to_first_departure() {
        let tt = TestFeed::new()
            .station("A", 34.0, 32.0)
            .station("B", 34.1, 32.0)
            .trip("T1", None, &[("A", "10:20:00"), ("B", "10:40:00")])
            .build();
        let a = tt.station_by_code("A").unwrap().id;
        let b = tt.station_by_code("B").unwrap().id;

        let mut scope = tt.scope();
        let origin = scope.add_synthetic_station(Coordinate::new(33.99, 32.0), "origin").unwrap();
        scope
            .add_synthetic_connection(TripKind::Footpath, origin, a, time("10:00:00"), 300)
            .unwrap();

        let hints = HashMap::new();
        let params = SearchParams {
            origin,
            target: b,
            departure: time("10:00:00"),
            max_rounds: 3,
            max_walk_secs: 900,
            slack_secs: 0,
        };
        let outcome = RouteSearch::new(&scope, &hints).run(&params).unwrap();
        let mut journey = reconstruct(&scope, &outcome, &outcome.candidates[0], b).unwrap();
        assert_eq!(journey.departure_time(), time("10:00:00"));

        optimize_departure(&mut journey);
        assert_eq!(journey.departure_time(), time("10:15:00"));
        assert_eq!(journey.legs().next().unwrap().arrival_time(), time("10:20:00"));
        assert_eq!(journey.arrival_time(), time("10:40:00"));
    }

    #[test]
    fn car_leg_not_shifted() {
        let tt = TestFeed::new()
            .station("A", 34.0, 32.0)
            .station("B", 34.1, 32.0)
            .trip("T1", None, &[("A", "10:20:00"), ("B", "10:40:00")])
            .build();
        let a = tt.station_by_code("A").unwrap().id;
        let b = tt.station_by_code("B").unwrap().id;

        let mut scope = tt.scope();
        let start = scope.add_synthetic_station(Coordinate::new(33.9, 32.0), "car").unwrap();
        scope
            .add_synthetic_connection(TripKind::Car, start, a, time("10:00:00"), 300)
            .unwrap();

        let hints = HashMap::new();
        let params = SearchParams {
            origin: start,
            target: b,
            departure: time("10:00:00"),
            max_rounds: 3,
            max_walk_secs: 900,
            slack_secs: 0,
        };
        let outcome = RouteSearch::new(&scope, &hints).run(&params).unwrap();
        let mut journey = reconstruct(&scope, &outcome, &outcome.candidates[0], b).unwrap();
        assert_eq!(journey.legs().next().unwrap().mode(), LegMode::Car);

        optimize_departure(&mut journey);
        assert_eq!(journey.departure_time(), time("10:00:00"));
    }
}
