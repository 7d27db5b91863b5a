//! Journey planner.
//!
//! Answers "how do I get from this point to that one, leaving at this
//! time?". Walking times to and from nearby stations come from a
//! travel-time provider and become synthetic footpaths in a per-query
//! timetable scope, together with any car ride on offer. A round-based
//! earliest-arrival search then runs over the scope, and each round's best
//! finish is turned back into a journey.

mod access;
mod car;
mod config;
mod error;
mod rank;
mod reconstruct;
mod search;


use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{Coordinate, DayTime, Journey, Station, StationId};
use crate::timetable::{Timetable, TimetableScope};
use crate::travel::{TravelMode, TravelTimeProvider};

pub use car::{CarCorridor, CarOffer, PassableStation, insert_car_legs, passable_stations};
pub use config::SearchConfig;
pub use error::PlanError;
pub use rank::{deduplicate, rank_journeys};
pub use reconstruct::{optimize_departure, reconstruct};
pub use search::{Label, Ride, RoundCandidate, RouteSearch, SearchOutcome, SearchParams};

/// Largest `max_transfers` a query may ask for.
pub const MAX_TRANSFERS_LIMIT: usize = 16;

/// Rejects transfer caps above [`MAX_TRANSFERS_LIMIT`].
fn check_max_transfers(max_transfers: Option<usize>) -> Result<(), PlanError> {
    match max_transfers {
        Some(n) if n > MAX_TRANSFERS_LIMIT => Err(PlanError::InvalidRequest(format!(
            "max_transfers must be at most {MAX_TRANSFERS_LIMIT}, got {n}"
        ))),
        _ => Ok(()),
    }
}

/// A point-to-point journey request.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteQuery {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub departure: DayTime,
    /// Falls back to [`SearchConfig::max_transfers`].
    pub max_transfers: Option<usize>,
    /// Falls back to [`SearchConfig::max_walk_secs`].
    pub max_walk_secs: Option<u32>,
    pub car: Option<CarOffer>,
}

impl RouteQuery {
    /// Create a query with default limits and no car.
    pub fn new(origin: Coordinate, destination: Coordinate, departure: DayTime) -> Self {
        Self {
            origin,
            destination,
            departure,
            max_transfers: None,
            max_walk_secs: None,
            car: None,
        }
    }

    pub fn with_max_transfers(mut self, n: usize) -> Self {
        self.max_transfers = Some(n);
        self
    }

    pub fn with_max_walk_secs(mut self, secs: u32) -> Self {
        self.max_walk_secs = Some(secs);
        self
    }

    pub fn with_car(mut self, offer: CarOffer) -> Self {
        self.car = Some(offer);
        self
    }

    /// Validate the query.
    pub fn validate(&self) -> Result<(), PlanError> {
        if !self.origin.is_valid() {
            return Err(PlanError::InvalidRequest("origin is not a valid coordinate".into()));
        }
        if !self.destination.is_valid() {
            return Err(PlanError::InvalidRequest(
                "destination is not a valid coordinate".into(),
            ));
        }
        check_max_transfers(self.max_transfers)?;
        if let Some(car) = &self.car {
            if !car.start.is_valid() || !car.end.is_valid() {
                return Err(PlanError::InvalidRequest(
                    "car start and end must be valid coordinates".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Journeys found for a query, with the places they mention.
#[derive(Debug, Clone, Default)]
pub struct JourneyPlan {
    pub journeys: Vec<Journey>,
    /// Every station the journeys touch, synthetic ones included. Synthetic
    /// ids are only meaningful within this plan.
    pub places: BTreeMap<StationId, Station>,
}

impl JourneyPlan {
    pub fn place(&self, id: StationId) -> Option<&Station> {
        self.places.get(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.journeys.is_empty()
    }
}

/// Journey planner over a shared timetable.
pub struct Planner<P> {
    timetable: Arc<Timetable>,
    provider: P,
    config: SearchConfig,
}

impl<P: TravelTimeProvider> Planner<P> {
    /// Create a new planner.
    pub fn new(timetable: Arc<Timetable>, provider: P, config: SearchConfig) -> Self {
        Self {
            timetable,
            provider,
            config,
        }
    }

    pub fn timetable(&self) -> &Arc<Timetable> {
        &self.timetable
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Plans journeys between two arbitrary points.
    ///
    /// Provider failures never fail the query: the affected first mile,
    /// last mile or car ride is simply missing. No journey is an empty
    /// plan, not an error.
    pub async fn find_routes(&self, query: &RouteQuery) -> Result<JourneyPlan, PlanError> {
        query.validate()?;

        let max_transfers = query.max_transfers.unwrap_or(self.config.max_transfers);
        let max_walk_secs = query.max_walk_secs.unwrap_or(self.config.max_walk_secs);
        let batch = self.config.max_matrix_targets;
        let stations = self.timetable.stations();

        let corridor = match &query.car {
            Some(offer) => self.car_corridor(offer).await,
            None => None,
        };

        let mut access_points: Vec<Coordinate> = stations.iter().map(|s| s.location).collect();
        let mut egress_points = access_points.clone();
        if let (Some(offer), Some(_)) = (&query.car, &corridor) {
            access_points.push(offer.start);
            egress_points.push(offer.end);
        }

        let (access_times, egress_times) = futures::join!(
            access::one_to_many(
                &self.provider,
                query.origin,
                &access_points,
                TravelMode::Walk,
                batch
            ),
            access::many_to_one(
                &self.provider,
                &egress_points,
                query.destination,
                TravelMode::Walk,
                batch
            )
        );

        let mut scope = self.timetable.scope();
        let origin = scope.add_synthetic_station(query.origin, "origin")?;
        let destination = scope.add_synthetic_station(query.destination, "destination")?;

        let mut access_ids: Vec<StationId> = stations.iter().map(|s| s.id).collect();
        let mut egress_ids = access_ids.clone();
        if let (Some(offer), Some(corridor)) = (&query.car, &corridor) {
            let car_start = scope.add_synthetic_station(offer.start, "car start")?;
            let car_end = scope.add_synthetic_station(offer.end, "car end")?;
            car::insert_car_legs(&mut scope, car_start, car_end, offer.departure, corridor)?;
            access_ids.push(car_start);
            egress_ids.push(car_end);
        }

        let reachable = access::within_cap(&access_ids, &access_times, max_walk_secs);
        let hints = access::egress_hints(access::within_cap(
            &egress_ids,
            &egress_times,
            max_walk_secs,
        ));
        debug!(
            access = reachable.len(),
            egress = hints.len(),
            max_walk_secs,
            "first and last mile resolved"
        );
        access::insert_access(&mut scope, origin, query.departure, reachable)?;
        debug!(
            stations = scope.synthetic_stations().count(),
            connections = scope.synthetic_connection_count(),
            "query scope built"
        );

        let params = SearchParams {
            origin,
            target: destination,
            departure: query.departure,
            // The access walk and any car ride take a round each
            max_rounds: max_transfers
                .saturating_add(2)
                .saturating_add(usize::from(corridor.is_some())),
            max_walk_secs,
            slack_secs: self.config.slack_secs,
        };
        let journeys = self.search(&scope, &params, &hints)?;
        let places = collect_places(&scope, &journeys);

        Ok(JourneyPlan { journeys, places })
    }

    /// Plans journeys between two timetable stations.
    ///
    /// Never calls the provider.
    pub fn find_station_routes(
        &self,
        from: StationId,
        to: StationId,
        departure: DayTime,
        max_transfers: Option<usize>,
    ) -> Result<Vec<Journey>, PlanError> {
        for id in [from, to] {
            if self.timetable.station(id).is_none() {
                return Err(PlanError::InvalidRequest(format!("unknown station {id}")));
            }
        }
        check_max_transfers(max_transfers)?;
        if from == to {
            return Err(PlanError::InvalidRequest(
                "origin and destination are the same station".into(),
            ));
        }

        let scope = self.timetable.scope();
        let params = SearchParams {
            origin: from,
            target: to,
            departure,
            max_rounds: max_transfers
                .unwrap_or(self.config.max_transfers)
                .saturating_add(1),
            max_walk_secs: self.config.max_walk_secs,
            slack_secs: self.config.slack_secs,
        };
        self.search(&scope, &params, &HashMap::new())
    }

    async fn car_corridor(&self, offer: &CarOffer) -> Option<CarCorridor> {
        let deviation = offer
            .deviation_secs
            .unwrap_or(self.config.car_deviation_secs);

        match car::passable_stations(
            &self.provider,
            self.timetable.stations(),
            offer.start,
            offer.end,
            deviation,
            self.config.max_matrix_targets,
        )
        .await
        {
            Ok(Some(corridor)) => Some(corridor),
            Ok(None) => {
                debug!("car offer has no drivable route");
                None
            }
            Err(e) => {
                warn!(error = %e, "car corridor lookup failed, ignoring car offer");
                None
            }
        }
    }

    fn search(
        &self,
        scope: &TimetableScope<'_>,
        params: &SearchParams,
        hints: &HashMap<StationId, u32>,
    ) -> Result<Vec<Journey>, PlanError> {
        let outcome = RouteSearch::new(scope, hints).run(params)?;

        let mut journeys = Vec::with_capacity(outcome.candidates.len());
        for candidate in &outcome.candidates {
            let mut journey = reconstruct(scope, &outcome, candidate, params.target)?;
            if self.config.optimize_departure {
                optimize_departure(&mut journey);
            }
            journeys.push(journey);
        }

        let journeys = rank_journeys(deduplicate(journeys));

        debug!(
            origin = %params.origin,
            target = %params.target,
            rounds = outcome.rounds_run(),
            journeys = journeys.len(),
            "search complete"
        );

        Ok(journeys)
    }
}

/// Copies every station the journeys mention out of the scope.
fn collect_places(scope: &TimetableScope<'_>, journeys: &[Journey]) -> BTreeMap<StationId, Station> {
    let mut places = BTreeMap::new();
    for journey in journeys {
        for segment in journey.segments() {
            let ids = match segment.as_leg() {
                Some(leg) => leg
                    .connections()
                    .iter()
                    .flat_map(|c| [c.departure_station, c.arrival_station])
                    .collect(),
                None => vec![segment.origin(), segment.destination()],
            };
            for id in ids {
                if let Some(station) = scope.station(id) {
                    places.entry(id).or_insert_with(|| station.clone());
                }
            }
        }
    }
    places
}
