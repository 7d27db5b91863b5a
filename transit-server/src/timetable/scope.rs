//! Per-query overlay on the shared timetable.

use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;

use super::{Timetable, TimetableError};
use crate::domain::{
    Connection, Coordinate, DayTime, Station, StationId, StationKind, Trip, TripId, TripKind,
};

/// Synthetic stations, trips and connections for one query.
///
/// Reads fall through to the shared [`Timetable`]; writes only touch the
/// scope. Dropping the scope discards everything it added, and concurrent
/// scopes never see each other's additions.
#[derive(Debug)]
pub struct TimetableScope<'a> {
    base: &'a Timetable,
    stations: BTreeMap<StationId, Station>,
    trips: HashMap<TripId, Trip>,
    by_station: HashMap<StationId, Vec<Connection>>,
    by_trip: HashMap<TripId, Vec<Connection>>,
}

impl<'a> TimetableScope<'a> {
    pub(super) fn new(base: &'a Timetable) -> Self {
        Self {
            base,
            stations: BTreeMap::new(),
            trips: HashMap::new(),
            by_station: HashMap::new(),
            by_trip: HashMap::new(),
        }
    }

    /// The shared timetable under this scope.
    pub fn base(&self) -> &'a Timetable {
        self.base
    }

    /// Creates a station at an arbitrary point. It has no connections yet.
    pub fn add_synthetic_station(
        &mut self,
        location: Coordinate,
        name: &str,
    ) -> Result<StationId, TimetableError> {
        let id = StationId(self.base.next_synthetic_id()?);
        self.stations.insert(
            id,
            Station {
                id,
                code: name.to_string(),
                name: name.to_string(),
                location,
                kind: StationKind::Synthetic,
            },
        );
        Ok(id)
    }

    /// Registers a fresh trip for a footpath or car connection.
    pub fn add_synthetic_trip(&mut self, kind: TripKind) -> Result<TripId, TimetableError> {
        let id = TripId(self.base.next_synthetic_id()?);
        self.trips.insert(id, Trip::synthetic(id, kind));
        Ok(id)
    }

    /// Appends a connection to its trip and to its departure station's list.
    ///
    /// The trip must have been created in this scope. Per station,
    /// connections must arrive in non-decreasing departure order.
    pub fn add_connection(&mut self, conn: Connection) -> Result<(), TimetableError> {
        if !conn.is_consistent() {
            return Err(TimetableError::Inconsistent {
                departure: conn.departure_time,
                arrival: conn.arrival_time,
            });
        }
        for station in [conn.departure_station, conn.arrival_station] {
            if self.station(station).is_none() {
                return Err(TimetableError::UnknownStation(station));
            }
        }
        if !self.trips.contains_key(&conn.trip_id) {
            return Err(TimetableError::TripNotFound(conn.trip_id));
        }

        let list = self.by_station.entry(conn.departure_station).or_default();
        if let Some(last) = list.last() {
            if conn.departure_time < last.departure_time {
                return Err(TimetableError::OutOfOrder {
                    station: conn.departure_station,
                    departure: conn.departure_time,
                    last: last.departure_time,
                });
            }
        }
        list.push(conn);
        self.by_trip.entry(conn.trip_id).or_default().push(conn);
        Ok(())
    }

    /// Creates a single-connection synthetic trip from `from` to `to`.
    pub fn add_synthetic_connection(
        &mut self,
        kind: TripKind,
        from: StationId,
        to: StationId,
        departure: DayTime,
        duration_secs: u32,
    ) -> Result<Connection, TimetableError> {
        let trip = self.add_synthetic_trip(kind)?;
        let conn = Connection::new(
            from,
            to,
            departure,
            departure.saturating_add_secs(duration_secs),
            trip,
        );
        self.add_connection(conn)?;
        Ok(conn)
    }

    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(&id).or_else(|| self.base.station(id))
    }

    pub fn trip(&self, id: TripId) -> Option<&Trip> {
        self.trips.get(&id).or_else(|| self.base.trip(id))
    }

    /// Display line name; synthetic trips have none.
    pub fn line_name(&self, trip: TripId) -> Option<&str> {
        if self.trips.contains_key(&trip) {
            return None;
        }
        self.base.line_name(trip)
    }

    /// Connections leaving `station` at or after `after`, in departure order.
    pub fn connections_from(
        &self,
        station: StationId,
        after: DayTime,
    ) -> impl Iterator<Item = &Connection> + '_ {
        let extra = match self.by_station.get(&station) {
            Some(list) => {
                let start = list.partition_point(|c| c.departure_time < after);
                &list[start..]
            }
            None => &[][..],
        };
        self.base
            .departures(station, after)
            .iter()
            .merge_by(extra.iter(), |a, b| a.departure_time <= b.departure_time)
    }

    /// Returns the rest of `conn`'s trip starting at `conn`, or with
    /// `upto_inclusive` the part of the trip ending at `conn`.
    ///
    /// Synthetic trips without a registered sequence are singletons.
    pub fn follow_trip<'s>(
        &'s self,
        conn: &'s Connection,
        upto_inclusive: bool,
    ) -> Result<&'s [Connection], TimetableError> {
        let sequence = match self.by_trip.get(&conn.trip_id) {
            Some(seq) => seq.as_slice(),
            None => match self.base.trip_connections(conn.trip_id) {
                Some(seq) => seq,
                None => {
                    return match self.trips.get(&conn.trip_id) {
                        Some(trip) if trip.kind.is_synthetic() => Ok(std::slice::from_ref(conn)),
                        _ => Err(TimetableError::TripNotFound(conn.trip_id)),
                    };
                }
            },
        };

        // Departures are non-decreasing along a trip
        let start = sequence.partition_point(|c| c.departure_time < conn.departure_time);
        let idx = sequence[start..]
            .iter()
            .position(|c| c == conn)
            .map(|pos| start + pos)
            .ok_or(TimetableError::NotInTrip {
                trip: conn.trip_id,
                departure: conn.departure_time,
            })?;

        if upto_inclusive {
            Ok(&sequence[..=idx])
        } else {
            Ok(&sequence[idx..])
        }
    }

    /// Synthetic stations created in this scope.
    pub fn synthetic_stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    /// Number of connections added in this scope.
    pub fn synthetic_connection_count(&self) -> usize {
        self.by_station.values().map(Vec::len).sum()
    }
}
