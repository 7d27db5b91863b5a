//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{Coordinate, DayTime, Journey, Leg, LegMode, Segment, Station, StationId, Walk};
use crate::planner::{CarOffer, JourneyPlan, RouteQuery};
use crate::timetable::Timetable;

/// Request to plan a journey between two points.
#[derive(Debug, Deserialize)]
pub struct PlanJourneyRequest {
    /// Where the traveller starts
    pub origin: Coordinate,

    /// Where the traveller wants to go
    pub destination: Coordinate,

    /// Departure time in HH:MM:SS format
    pub departure: DayTime,

    /// Maximum number of changes (defaults to the server config)
    pub max_transfers: Option<usize>,

    /// Maximum walk at either end, in seconds
    pub max_walk_secs: Option<u32>,

    /// An offered car ride
    pub car: Option<CarOffer>,
}

impl PlanJourneyRequest {
    /// Convert into a planner query.
    pub fn into_query(self) -> RouteQuery {
        RouteQuery {
            origin: self.origin,
            destination: self.destination,
            departure: self.departure,
            max_transfers: self.max_transfers,
            max_walk_secs: self.max_walk_secs,
            car: self.car,
        }
    }
}

/// Request to plan a journey between two timetable stations.
#[derive(Debug, Deserialize)]
pub struct StationJourneyRequest {
    /// Origin station code
    pub from: String,

    /// Destination station code
    pub to: String,

    /// Departure time in HH:MM:SS format
    pub departure: DayTime,

    pub max_transfers: Option<usize>,
}

/// Stations around a point.
#[derive(Debug, Deserialize)]
pub struct NearbyRequest {
    pub lon: f64,
    pub lat: f64,

    /// Search radius in metres (defaults to 500)
    pub radius: Option<f64>,
}

/// Stations inside a bounding box.
#[derive(Debug, Deserialize)]
pub struct BoundsRequest {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundsRequest {
    /// South-west and north-east corners.
    pub fn corners(&self) -> (Coordinate, Coordinate) {
        (
            Coordinate::new(self.min_lon, self.min_lat),
            Coordinate::new(self.max_lon, self.max_lat),
        )
    }

    pub fn is_valid(&self) -> bool {
        let (min, max) = self.corners();
        min.is_valid() && max.is_valid() && min.lon <= max.lon && min.lat <= max.lat
    }
}

/// Looks up the stations a journey mentions.
pub trait Places {
    fn place(&self, id: StationId) -> Option<&Station>;
}

impl Places for JourneyPlan {
    fn place(&self, id: StationId) -> Option<&Station> {
        JourneyPlan::place(self, id)
    }
}

impl Places for Timetable {
    fn place(&self, id: StationId) -> Option<&Station> {
        self.station(id)
    }
}

/// A station in responses.
#[derive(Debug, Clone, Serialize)]
pub struct StationResult {
    /// Station code; synthetic places use their label
    pub code: String,

    /// Display name
    pub name: String,

    pub lon: f64,
    pub lat: f64,

    /// True for the query's own origin, destination and car points
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,
}

impl StationResult {
    pub fn from_station(station: &Station) -> Self {
        Self {
            code: station.code.clone(),
            name: station.name.clone(),
            lon: station.lon(),
            lat: station.lat(),
            synthetic: station.is_synthetic(),
        }
    }

    fn lookup(places: &impl Places, id: StationId) -> Self {
        match places.place(id) {
            Some(station) => Self::from_station(station),
            None => Self {
                code: id.to_string(),
                name: id.to_string(),
                lon: f64::NAN,
                lat: f64::NAN,
                synthetic: true,
            },
        }
    }
}

/// Response listing stations.
#[derive(Debug, Serialize)]
pub struct StationsResponse {
    pub stations: Vec<StationResult>,
}

/// A stop on a leg.
#[derive(Debug, Serialize)]
pub struct StopResult {
    pub station: StationResult,

    /// Arrival time (HH:MM:SS); absent at the boarding stop
    pub arrival: Option<String>,

    /// Departure time (HH:MM:SS); absent at the alighting stop
    pub departure: Option<String>,
}

/// A ride along one trip.
#[derive(Debug, Serialize)]
pub struct LegResult {
    /// Transit, walk or car
    pub mode: LegMode,

    /// Line name (transit only)
    pub line: Option<String>,

    /// Boarding station
    pub origin: StationResult,

    /// Alighting station
    pub destination: StationResult,

    pub departure: String,
    pub arrival: String,

    /// Every stop from boarding to alighting
    pub stops: Vec<StopResult>,
}

/// The final walk to the destination.
#[derive(Debug, Serialize)]
pub struct WalkResult {
    pub from: StationResult,
    pub to: StationResult,
    pub departure: String,
    pub arrival: String,
    pub duration_secs: u32,
}

/// One segment of a journey.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentResult {
    Leg(LegResult),
    Walk(WalkResult),
}

/// A planned journey.
#[derive(Debug, Serialize)]
pub struct JourneyResult {
    pub segments: Vec<SegmentResult>,

    /// Departure time (HH:MM:SS)
    pub departure: String,

    /// Arrival time (HH:MM:SS)
    pub arrival: String,

    pub duration_secs: u32,

    /// Changes between transit vehicles
    pub transfers: usize,

    /// Transit lines ridden, in order
    pub lines: Vec<String>,

    /// Time spent walking
    pub walk_secs: u32,
}

/// Response with planned journeys, best first.
#[derive(Debug, Serialize)]
pub struct PlanJourneyResponse {
    pub journeys: Vec<JourneyResult>,
}

impl PlanJourneyResponse {
    pub fn from_plan(plan: &JourneyPlan) -> Self {
        Self::from_journeys(&plan.journeys, plan)
    }

    pub fn from_journeys(journeys: &[Journey], places: &impl Places) -> Self {
        Self {
            journeys: journeys
                .iter()
                .map(|j| JourneyResult::from_journey(j, places))
                .collect(),
        }
    }
}

impl JourneyResult {
    pub fn from_journey(journey: &Journey, places: &impl Places) -> Self {
        Self {
            segments: journey
                .segments()
                .iter()
                .map(|s| match s {
                    Segment::Trip(leg) => SegmentResult::Leg(LegResult::from_leg(leg, places)),
                    Segment::Egress(walk) => SegmentResult::Walk(WalkResult::from_walk(walk, places)),
                })
                .collect(),
            departure: journey.departure_time().to_string(),
            arrival: journey.arrival_time().to_string(),
            duration_secs: journey.duration_secs(),
            transfers: journey.transfer_count(),
            lines: journey.lines().into_iter().map(str::to_string).collect(),
            walk_secs: journey.walk_secs(),
        }
    }
}

impl LegResult {
    pub fn from_leg(leg: &Leg, places: &impl Places) -> Self {
        let conns = leg.connections();
        let mut stops: Vec<StopResult> = conns
            .iter()
            .enumerate()
            .map(|(i, c)| StopResult {
                station: StationResult::lookup(places, c.departure_station),
                arrival: (i > 0).then(|| conns[i - 1].arrival_time.to_string()),
                departure: Some(c.departure_time.to_string()),
            })
            .collect();
        if let Some(last) = conns.last() {
            stops.push(StopResult {
                station: StationResult::lookup(places, last.arrival_station),
                arrival: Some(last.arrival_time.to_string()),
                departure: None,
            });
        }

        Self {
            mode: leg.mode(),
            line: leg.line().map(str::to_string),
            origin: StationResult::lookup(places, leg.board_station()),
            destination: StationResult::lookup(places, leg.alight_station()),
            departure: leg.departure_time().to_string(),
            arrival: leg.arrival_time().to_string(),
            stops,
        }
    }
}

impl WalkResult {
    pub fn from_walk(walk: &Walk, places: &impl Places) -> Self {
        Self {
            from: StationResult::lookup(places, walk.from),
            to: StationResult::lookup(places, walk.to),
            departure: walk.departure.to_string(),
            arrival: walk.arrival.to_string(),
            duration_secs: walk.duration_secs(),
        }
    }
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Connection, TripId};
    use crate::timetable::testing::TestFeed;
    use std::sync::Arc;

    fn time(s: &str) -> DayTime {
        DayTime::parse(s).unwrap()
    }

    fn feed() -> Arc<Timetable> {
        TestFeed::new()
            .station("A", 34.78, 32.08)
            .station("B", 34.79, 32.08)
            .station("C", 34.80, 32.08)
            .route("R1", "5")
            .trip(
                "T1",
                Some("R1"),
                &[("A", "10:00:00"), ("B", "10:10:00"), ("C", "10:20:00")],
            )
            .build()
    }

    fn ride(tt: &Timetable) -> Leg {
        let trip = TripId(0);
        assert_eq!(tt.trip(trip).unwrap().code, "T1");
        let conns: Vec<Connection> = tt.trip_connections(trip).unwrap().to_vec();
        Leg::new(LegMode::Transit, Some("5".into()), conns).unwrap()
    }

    #[test]
    fn leg_result_lists_every_stop() {
        let tt = feed();
        let result = LegResult::from_leg(&ride(&tt), tt.as_ref());

        assert_eq!(result.origin.code, "A");
        assert_eq!(result.destination.code, "C");
        assert_eq!(result.line.as_deref(), Some("5"));
        assert_eq!(result.departure, "10:00:00");
        assert_eq!(result.arrival, "10:20:00");

        let codes: Vec<_> = result.stops.iter().map(|s| s.station.code.as_str()).collect();
        assert_eq!(codes, vec!["A", "B", "C"]);
        assert_eq!(result.stops[0].arrival, None);
        assert_eq!(result.stops[1].arrival.as_deref(), Some("10:10:00"));
        assert_eq!(result.stops[1].departure.as_deref(), Some("10:10:00"));
        assert_eq!(result.stops[2].departure, None);
    }

    #[test]
    fn journey_result_summary() {
        let tt = feed();
        let c = tt.station_by_code("C").unwrap().id;
        let b = tt.station_by_code("B").unwrap().id;
        let journey = Journey::new(vec![
            Segment::Trip(ride(&tt)),
            Segment::Egress(Walk::new(c, b, time("10:20:00"), 300)),
        ])
        .unwrap();

        let result = JourneyResult::from_journey(&journey, tt.as_ref());
        assert_eq!(result.departure, "10:00:00");
        assert_eq!(result.arrival, "10:25:00");
        assert_eq!(result.duration_secs, 1500);
        assert_eq!(result.transfers, 0);
        assert_eq!(result.lines, vec!["5".to_string()]);
        assert_eq!(result.walk_secs, 300);
        assert!(matches!(result.segments[1], SegmentResult::Walk(ref w) if w.duration_secs == 300));
    }

    #[test]
    fn segments_are_tagged() {
        let tt = feed();
        let journey = Journey::new(vec![Segment::Trip(ride(&tt))]).unwrap();
        let json = serde_json::to_value(PlanJourneyResponse::from_journeys(&[journey], tt.as_ref()))
            .unwrap();

        let segment = &json["journeys"][0]["segments"][0];
        assert_eq!(segment["type"], "leg");
        assert_eq!(segment["mode"], "transit");
        // Feed stations don't carry the synthetic flag
        assert!(segment["origin"].get("synthetic").is_none());
    }

    #[test]
    fn unknown_place_is_still_rendered() {
        let tt = feed();
        let walk = Walk::new(StationId(99), StationId(98), time("09:00:00"), 60);
        let result = WalkResult::from_walk(&walk, tt.as_ref());
        assert_eq!(result.from.code, "99");
        assert!(result.from.synthetic);
    }

    #[test]
    fn parse_plan_request() {
        let json = r#"{
            "origin": {"lon": 34.78, "lat": 32.08},
            "destination": {"lon": 34.80, "lat": 32.10},
            "departure": "08:30:00",
            "car": {
                "start": {"lon": 34.70, "lat": 32.00},
                "end": {"lon": 34.90, "lat": 32.20},
                "departure": "08:00:00"
            }
        }"#;
        let query = serde_json::from_str::<PlanJourneyRequest>(json)
            .unwrap()
            .into_query();

        assert_eq!(query.departure, time("08:30:00"));
        assert_eq!(query.max_transfers, None);
        let car = query.car.unwrap();
        assert_eq!(car.departure, time("08:00:00"));
        assert_eq!(car.deviation_secs, None);
    }

    #[test]
    fn bad_departure_rejected() {
        let json = r#"{
            "origin": {"lon": 34.78, "lat": 32.08},
            "destination": {"lon": 34.80, "lat": 32.10},
            "departure": "8.30"
        }"#;
        assert!(serde_json::from_str::<PlanJourneyRequest>(json).is_err());
    }

    #[test]
    fn bounds_validation() {
        let ok = BoundsRequest {
            min_lon: 34.0,
            max_lon: 35.0,
            min_lat: 32.0,
            max_lat: 33.0,
        };
        assert!(ok.is_valid());

        let flipped = BoundsRequest {
            min_lon: 35.0,
            max_lon: 34.0,
            ..ok
        };
        assert!(!flipped.is_valid());
    }
}
