//! In-memory timetable.
//!
//! The `Timetable` is built once from a feed snapshot and is immutable
//! afterwards; it is shared between queries behind an `Arc`. Each query
//! gets a [`TimetableScope`] on top of it for the synthetic stations, trips
//! and connections it needs, and drops the scope when done.
//!
//! Two indices are derived at load time:
//! - per station, outgoing connections sorted by departure time
//! - per trip, connections in travel order

mod error;
mod scope;
mod snapshot;

#[cfg(test)]
pub(crate) mod testing;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::debug;

use crate::domain::{
    Connection, Coordinate, DayTime, Route, RouteId, Station, StationId, StationKind, Trip, TripId,
    TripKind,
};

pub use error::{SnapshotError, TimetableError};
pub use scope::TimetableScope;
pub use snapshot::{FeedSnapshot, StationRecord, StopTimeRecord, TripRecord};

/// The persistent timetable.
#[derive(Debug)]
pub struct Timetable {
    stations: Vec<Station>,
    station_codes: HashMap<String, StationId>,
    routes: Vec<Route>,
    trips: Vec<Trip>,
    by_station: Vec<Vec<Connection>>,
    by_trip: Vec<Vec<Connection>>,
    connection_count: usize,

    /// Next id handed out to a synthetic station or trip.
    next_id: AtomicU32,
}

impl Timetable {
    /// Builds the timetable from a snapshot.
    ///
    /// Each pair of consecutive stop times becomes one connection, departing
    /// at the first stop's departure and arriving at the second stop's
    /// arrival.
    pub fn from_snapshot(snapshot: FeedSnapshot) -> Result<Self, SnapshotError> {
        let route_ids: HashMap<&str, RouteId> = snapshot
            .routes
            .iter()
            .enumerate()
            .map(|(i, r)| (r.code.as_str(), RouteId(i as u32)))
            .collect();

        let mut stations = Vec::with_capacity(snapshot.stations.len());
        let mut station_codes = HashMap::with_capacity(snapshot.stations.len());
        for (i, record) in snapshot.stations.into_iter().enumerate() {
            let id = StationId(i as u32);
            if station_codes.insert(record.id.clone(), id).is_some() {
                return Err(SnapshotError::DuplicateStation(record.id));
            }
            stations.push(Station {
                id,
                code: record.id,
                name: record.name,
                location: Coordinate::new(record.lon, record.lat),
                kind: StationKind::Persistent,
            });
        }

        let mut by_station: Vec<Vec<Connection>> = vec![Vec::new(); stations.len()];
        let mut by_trip = Vec::with_capacity(snapshot.trips.len());
        let mut trips = Vec::with_capacity(snapshot.trips.len());
        let mut connection_count = 0;

        for (i, record) in snapshot.trips.into_iter().enumerate() {
            let id = TripId(i as u32);

            let route = match &record.route {
                Some(code) => Some(*route_ids.get(code.as_str()).ok_or_else(|| {
                    SnapshotError::UnknownRoute {
                        trip: record.id.clone(),
                        route: code.clone(),
                    }
                })?),
                None => None,
            };

            if record.stop_times.len() < 2 {
                return Err(SnapshotError::TooFewStops(record.id));
            }

            let mut calls = Vec::with_capacity(record.stop_times.len());
            for (stop, st) in record.stop_times.iter().enumerate() {
                let station = *station_codes.get(&st.station).ok_or_else(|| {
                    SnapshotError::UnknownStation {
                        trip: record.id.clone(),
                        station: st.station.clone(),
                    }
                })?;
                if st.departure < st.arrival {
                    return Err(SnapshotError::TimeTravel {
                        trip: record.id.clone(),
                        stop,
                    });
                }
                calls.push((station, st.arrival, st.departure));
            }

            let mut sequence = Vec::with_capacity(calls.len() - 1);
            for (stop, pair) in calls.windows(2).enumerate() {
                let (from, _, departure) = pair[0];
                let (to, arrival, _) = pair[1];
                if arrival < departure {
                    return Err(SnapshotError::TimeTravel {
                        trip: record.id.clone(),
                        stop: stop + 1,
                    });
                }
                let conn = Connection::new(from, to, departure, arrival, id);
                by_station[from.index()].push(conn);
                sequence.push(conn);
            }

            connection_count += sequence.len();
            by_trip.push(sequence);
            trips.push(Trip {
                id,
                code: record.id,
                kind: TripKind::Scheduled,
                route,
            });
        }

        // Stable sort keeps travel order for equal departures
        for list in &mut by_station {
            list.sort_by_key(|c| c.departure_time);
        }

        let next_id = stations.len().max(trips.len()) as u32;

        debug!(
            stations = stations.len(),
            trips = trips.len(),
            routes = snapshot.routes.len(),
            connections = connection_count,
            "built timetable"
        );

        Ok(Self {
            stations,
            station_codes,
            routes: snapshot.routes,
            trips,
            by_station,
            by_trip,
            connection_count,
            next_id: AtomicU32::new(next_id),
        })
    }

    /// Opens a query scope for synthetic additions.
    pub fn scope(&self) -> TimetableScope<'_> {
        TimetableScope::new(self)
    }

    /// Returns all persistent stations, indexed by id.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(id.index())
    }

    /// Looks up a station by its feed code.
    pub fn station_by_code(&self, code: &str) -> Option<&Station> {
        self.station_codes.get(code).and_then(|id| self.station(*id))
    }

    /// Stations inside a longitude/latitude bounding box.
    pub fn stations_within(
        &self,
        min: Coordinate,
        max: Coordinate,
    ) -> impl Iterator<Item = &Station> {
        self.stations.iter().filter(move |s| {
            (min.lon..=max.lon).contains(&s.lon()) && (min.lat..=max.lat).contains(&s.lat())
        })
    }

    pub fn trip(&self, id: TripId) -> Option<&Trip> {
        self.trips.get(id.0 as usize)
    }

    pub fn route(&self, id: RouteId) -> Option<&Route> {
        self.routes.get(id.0 as usize)
    }

    /// Display line name for a scheduled trip.
    pub fn line_name(&self, trip: TripId) -> Option<&str> {
        let route = self.trip(trip)?.route?;
        self.route(route).map(|r| r.short_name.as_str())
    }

    /// Connections leaving `station` at or after `after`, in departure order.
    pub fn departures(&self, station: StationId, after: DayTime) -> &[Connection] {
        match self.by_station.get(station.index()) {
            Some(list) => {
                let start = list.partition_point(|c| c.departure_time < after);
                &list[start..]
            }
            None => &[],
        }
    }

    /// The full connection sequence of a scheduled trip.
    pub fn trip_connections(&self, trip: TripId) -> Option<&[Connection]> {
        self.by_trip.get(trip.0 as usize).map(Vec::as_slice)
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connection_count
    }

    /// Hands out a fresh id for a synthetic station or trip.
    ///
    /// Ids are never reused, so scopes open at the same time don't collide.
    /// Once the id space runs out every call fails instead of wrapping onto
    /// persistent ids.
    pub(crate) fn next_synthetic_id(&self) -> Result<u32, TimetableError> {
        self.next_id
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_add(1))
            .map_err(|_| TimetableError::IdsExhausted)
    }

    #[cfg(test)]
    pub(crate) fn set_next_synthetic_id(&self, id: u32) {
        self.next_id.store(id, Ordering::Relaxed);
    }
}
