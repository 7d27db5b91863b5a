//! Journey types.
//!
//! A `Journey` is the reconstructed answer to a query: an ordered list of
//! segments, each either a ride along one trip (transit vehicle, walking
//! footpath or car) or the final walk from the alighting station to the
//! destination.

use serde::{Deserialize, Serialize};

use super::{Connection, DayTime, DomainError, StationId, TripId};

/// How a leg is travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegMode {
    /// A scheduled transit vehicle.
    Transit,
    /// A synthetic walking connection.
    Walk,
    /// A synthetic car connection.
    Car,
}

/// A contiguous ride along a single trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leg {
    mode: LegMode,
    line: Option<String>,
    connections: Vec<Connection>,
}

impl Leg {
    /// Creates a leg from the connections travelled on one trip.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `connections` is empty or the connections don't chain
    /// (arrival station of one = departure station of the next).
    pub fn new(
        mode: LegMode,
        line: Option<String>,
        connections: Vec<Connection>,
    ) -> Result<Self, DomainError> {
        if connections.is_empty() {
            return Err(DomainError::EmptyLeg);
        }

        for pair in connections.windows(2) {
            if pair[0].arrival_station != pair[1].departure_station {
                return Err(DomainError::BrokenLeg(
                    pair[0].arrival_station,
                    pair[1].departure_station,
                ));
            }
            if pair[1].departure_time < pair[0].arrival_time {
                return Err(DomainError::DepartsBeforeArrival {
                    departure: pair[1].departure_time,
                    arrival: pair[0].arrival_time,
                });
            }
        }

        Ok(Self {
            mode,
            line,
            connections,
        })
    }

    pub fn mode(&self) -> LegMode {
        self.mode
    }

    /// Line name shown to riders, for transit legs.
    pub fn line(&self) -> Option<&str> {
        self.line.as_deref()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn trip_id(&self) -> TripId {
        self.connections[0].trip_id
    }

    pub fn board_station(&self) -> StationId {
        self.connections[0].departure_station
    }

    pub fn alight_station(&self) -> StationId {
        self.last().arrival_station
    }

    pub fn departure_time(&self) -> DayTime {
        self.connections[0].departure_time
    }

    pub fn arrival_time(&self) -> DayTime {
        self.last().arrival_time
    }

    /// Number of stops travelled.
    pub fn hops(&self) -> usize {
        self.connections.len()
    }

    /// Shifts every connection of the leg by `secs` later.
    ///
    /// Only used for the access walk, whose single connection may start
    /// later than the query time without changing the journey.
    pub(crate) fn delay_by(&mut self, secs: u32) {
        for conn in &mut self.connections {
            conn.departure_time = conn.departure_time.saturating_add_secs(secs);
            conn.arrival_time = conn.arrival_time.saturating_add_secs(secs);
        }
    }

    fn last(&self) -> &Connection {
        // Non-empty by construction
        &self.connections[self.connections.len() - 1]
    }
}

/// The final walk from the alighting station to the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Walk {
    pub from: StationId,
    pub to: StationId,
    pub departure: DayTime,
    pub arrival: DayTime,
}

impl Walk {
    /// Creates a walk leaving `from` at `departure` and taking `secs`.
    pub fn new(from: StationId, to: StationId, departure: DayTime, secs: u32) -> Self {
        Self {
            from,
            to,
            departure,
            arrival: departure.saturating_add_secs(secs),
        }
    }

    pub fn duration_secs(&self) -> u32 {
        self.arrival.secs_since(self.departure)
    }
}

/// A segment of a journey: a ride along a trip or the egress walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A ride along one trip
    Trip(Leg),
    /// A walk to the destination with no timetable connection behind it
    Egress(Walk),
}

impl Segment {
    /// Returns the station this segment starts from.
    pub fn origin(&self) -> StationId {
        match self {
            Segment::Trip(leg) => leg.board_station(),
            Segment::Egress(walk) => walk.from,
        }
    }

    /// Returns the station this segment ends at.
    pub fn destination(&self) -> StationId {
        match self {
            Segment::Trip(leg) => leg.alight_station(),
            Segment::Egress(walk) => walk.to,
        }
    }

    pub fn departure_time(&self) -> DayTime {
        match self {
            Segment::Trip(leg) => leg.departure_time(),
            Segment::Egress(walk) => walk.departure,
        }
    }

    pub fn arrival_time(&self) -> DayTime {
        match self {
            Segment::Trip(leg) => leg.arrival_time(),
            Segment::Egress(walk) => walk.arrival,
        }
    }

    /// Returns the leg if this is a ride.
    pub fn as_leg(&self) -> Option<&Leg> {
        match self {
            Segment::Trip(leg) => Some(leg),
            Segment::Egress(_) => None,
        }
    }

    /// Returns true for walking rides and the egress walk.
    pub fn is_walk(&self) -> bool {
        match self {
            Segment::Trip(leg) => leg.mode() == LegMode::Walk,
            Segment::Egress(_) => true,
        }
    }
}

/// A complete journey from origin to destination.
///
/// # Invariants
///
/// - At least one segment
/// - Consecutive segments connect (destination of one = origin of next)
/// - No segment departs before the previous one arrives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Journey {
    segments: Vec<Segment>,
}

impl Journey {
    /// Constructs a journey from ordered segments.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the list is empty, or if consecutive segments don't
    /// connect in space or time.
    pub fn new(segments: Vec<Segment>) -> Result<Self, DomainError> {
        if segments.is_empty() {
            return Err(DomainError::EmptyJourney);
        }

        for window in segments.windows(2) {
            let (prev, next) = (&window[0], &window[1]);
            if prev.destination() != next.origin() {
                return Err(DomainError::Disconnected(prev.destination(), next.origin()));
            }
            if next.departure_time() < prev.arrival_time() {
                return Err(DomainError::DepartsBeforeArrival {
                    departure: next.departure_time(),
                    arrival: prev.arrival_time(),
                });
            }
        }

        Ok(Journey { segments })
    }

    /// Returns all segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub(crate) fn segments_mut(&mut self) -> &mut [Segment] {
        &mut self.segments
    }

    /// Returns all rides in order.
    pub fn legs(&self) -> impl Iterator<Item = &Leg> {
        self.segments.iter().filter_map(|s| s.as_leg())
    }

    /// Returns the rides on scheduled transit.
    pub fn transit_legs(&self) -> impl Iterator<Item = &Leg> {
        self.legs().filter(|l| l.mode() == LegMode::Transit)
    }

    /// Number of vehicle changes: transit rides minus one, or zero.
    pub fn transfer_count(&self) -> usize {
        self.transit_legs().count().saturating_sub(1)
    }

    /// Line names of the transit rides, in travel order.
    pub fn lines(&self) -> Vec<&str> {
        self.transit_legs().filter_map(|l| l.line()).collect()
    }

    /// Every timetable connection travelled, in order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.legs().flat_map(|l| l.connections().iter())
    }

    pub fn origin(&self) -> StationId {
        self.segments[0].origin()
    }

    pub fn destination(&self) -> StationId {
        self.segments[self.segments.len() - 1].destination()
    }

    pub fn departure_time(&self) -> DayTime {
        self.segments[0].departure_time()
    }

    pub fn arrival_time(&self) -> DayTime {
        self.segments[self.segments.len() - 1].arrival_time()
    }

    /// Total duration in seconds.
    pub fn duration_secs(&self) -> u32 {
        self.arrival_time().secs_since(self.departure_time())
    }

    /// Total time spent walking, in seconds.
    pub fn walk_secs(&self) -> u32 {
        self.segments
            .iter()
            .filter(|s| s.is_walk())
            .map(|s| s.arrival_time().secs_since(s.departure_time()))
            .sum()
    }

    /// Returns true if the journey uses no transit vehicle at all.
    pub fn is_walk_only(&self) -> bool {
        self.transit_legs().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(s: &str) -> DayTime {
        DayTime::parse(s).unwrap()
    }

    fn conn(from: u32, to: u32, dep: &str, arr: &str, trip: u32) -> Connection {
        Connection::new(StationId(from), StationId(to), time(dep), time(arr), TripId(trip))
    }

    fn transit(line: &str, conns: Vec<Connection>) -> Segment {
        Segment::Trip(Leg::new(LegMode::Transit, Some(line.into()), conns).unwrap())
    }

    #[test]
    fn leg_accessors() {
        let leg = Leg::new(
            LegMode::Transit,
            Some("18".into()),
            vec![
                conn(0, 1, "10:00:00", "10:05:00", 7),
                conn(1, 2, "10:06:00", "10:12:00", 7),
            ],
        )
        .unwrap();

        assert_eq!(leg.board_station(), StationId(0));
        assert_eq!(leg.alight_station(), StationId(2));
        assert_eq!(leg.departure_time(), time("10:00:00"));
        assert_eq!(leg.arrival_time(), time("10:12:00"));
        assert_eq!(leg.trip_id(), TripId(7));
        assert_eq!(leg.hops(), 2);
        assert_eq!(leg.line(), Some("18"));
    }

    #[test]
    fn leg_rejects_empty_and_broken() {
        assert_eq!(
            Leg::new(LegMode::Transit, None, vec![]),
            Err(DomainError::EmptyLeg)
        );

        let broken = Leg::new(
            LegMode::Transit,
            None,
            vec![
                conn(0, 1, "10:00:00", "10:05:00", 7),
                conn(3, 4, "10:06:00", "10:12:00", 7),
            ],
        );
        assert_eq!(
            broken,
            Err(DomainError::BrokenLeg(StationId(1), StationId(3)))
        );
    }

    #[test]
    fn delay_shifts_all_connections() {
        let mut leg = Leg::new(
            LegMode::Walk,
            None,
            vec![conn(0, 1, "09:55:00", "09:58:00", 3)],
        )
        .unwrap();
        leg.delay_by(120);
        assert_eq!(leg.departure_time(), time("09:57:00"));
        assert_eq!(leg.arrival_time(), time("10:00:00"));
    }

    #[test]
    fn journey_with_transfer_and_egress() {
        let journey = Journey::new(vec![
            Segment::Trip(
                Leg::new(
                    LegMode::Walk,
                    None,
                    vec![conn(100, 0, "09:50:00", "09:55:00", 50)],
                )
                .unwrap(),
            ),
            transit("A", vec![conn(0, 1, "10:00:00", "10:10:00", 1)]),
            transit("B", vec![conn(1, 2, "10:15:00", "10:30:00", 2)]),
            Segment::Egress(Walk::new(StationId(2), StationId(101), time("10:30:00"), 240)),
        ])
        .unwrap();

        assert_eq!(journey.origin(), StationId(100));
        assert_eq!(journey.destination(), StationId(101));
        assert_eq!(journey.departure_time(), time("09:50:00"));
        assert_eq!(journey.arrival_time(), time("10:34:00"));
        assert_eq!(journey.transfer_count(), 1);
        assert_eq!(journey.lines(), vec!["A", "B"]);
        assert_eq!(journey.connections().count(), 3);
        assert_eq!(journey.walk_secs(), 300 + 240);
        assert!(!journey.is_walk_only());
    }

    #[test]
    fn journey_rejects_gaps() {
        assert_eq!(Journey::new(vec![]), Err(DomainError::EmptyJourney));

        let result = Journey::new(vec![
            transit("A", vec![conn(0, 1, "10:00:00", "10:10:00", 1)]),
            transit("B", vec![conn(2, 3, "10:15:00", "10:30:00", 2)]),
        ]);
        assert_eq!(
            result,
            Err(DomainError::Disconnected(StationId(1), StationId(2)))
        );

        let result = Journey::new(vec![
            transit("A", vec![conn(0, 1, "10:00:00", "10:10:00", 1)]),
            transit("B", vec![conn(1, 3, "10:05:00", "10:30:00", 2)]),
        ]);
        assert!(matches!(
            result,
            Err(DomainError::DepartsBeforeArrival { .. })
        ));
    }

    #[test]
    fn direct_journey_has_no_transfers() {
        let journey =
            Journey::new(vec![transit("A", vec![conn(0, 1, "10:00:00", "10:20:00", 1)])]).unwrap();
        assert_eq!(journey.transfer_count(), 0);
        assert_eq!(journey.duration_secs(), 1200);
    }
}
