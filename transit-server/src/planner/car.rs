//! Car pass-through.
//!
//! A driver offering a ride from `start` to `end` can drop riders off or
//! pick them up at stations close to the fastest route. A station is
//! usable if going through it costs the driver less than the fastest time
//! plus the accepted deviation. Isochrones around both ends prune the
//! station set before any matrix is requested.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Coordinate, DayTime, Station, StationId, TripKind};
use crate::timetable::{TimetableError, TimetableScope};
use crate::travel::{TravelMode, TravelTimeError, TravelTimeProvider};

use super::access::{many_to_one, one_to_many};

/// A ride offered by a driver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarOffer {
    pub start: Coordinate,
    pub end: Coordinate,
    pub departure: DayTime,
    /// Extra seconds the driver accepts over the fastest route.
    #[serde(default)]
    pub deviation_secs: Option<u32>,
}

/// A station the car can pass through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassableStation {
    pub station: StationId,
    /// Driving time from the car's start.
    pub from_start_secs: u32,
    /// Driving time on to the car's end.
    pub to_end_secs: u32,
}

/// The fastest drive and the stations usable on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarCorridor {
    pub direct_secs: u32,
    /// Sorted by time from the start.
    pub stations: Vec<PassableStation>,
}

/// Finds the stations a car can pass through within `deviation_secs` of
/// its fastest route.
///
/// Returns `Ok(None)` if the provider can't route the car at all.
pub async fn passable_stations<P: TravelTimeProvider>(
    provider: &P,
    stations: &[Station],
    start: Coordinate,
    end: Coordinate,
    deviation_secs: u32,
    batch: usize,
) -> Result<Option<CarCorridor>, TravelTimeError> {
    let direct = provider.matrix(&[start], &[end], TravelMode::Drive).await?;
    let Some(direct_secs) = direct
        .first()
        .and_then(|row| row.first().copied().flatten())
        .map(|c| c.time_secs)
    else {
        return Ok(None);
    };

    let limit = direct_secs.saturating_add(deviation_secs);
    let half = limit / 2;
    if half == 0 {
        return Ok(Some(CarCorridor {
            direct_secs,
            stations: Vec::new(),
        }));
    }

    let thresholds = [half, limit];
    let from_start = provider.isochrone(start, &thresholds, TravelMode::Drive).await?;
    let from_end = provider.isochrone(end, &thresholds, TravelMode::Drive).await?;
    let [start_inner, start_outer] = from_start.as_slice() else {
        return Err(TravelTimeError::Geometry(format!(
            "expected 2 isochrones, got {}",
            from_start.len()
        )));
    };
    let [end_inner, end_outer] = from_end.as_slice() else {
        return Err(TravelTimeError::Geometry(format!(
            "expected 2 isochrones, got {}",
            from_end.len()
        )));
    };

    let candidates: Vec<&Station> = stations
        .iter()
        .filter(|s| {
            (start_inner.contains(s.location) && end_outer.contains(s.location))
                || (start_outer.contains(s.location) && end_inner.contains(s.location))
        })
        .collect();

    let locations: Vec<Coordinate> = candidates.iter().map(|s| s.location).collect();
    let to_candidates = one_to_many(provider, start, &locations, TravelMode::Drive, batch).await;

    let near: Vec<(&Station, u32)> = candidates
        .iter()
        .zip(to_candidates)
        .filter_map(|(s, t)| t.filter(|t1| *t1 < limit).map(|t1| (*s, t1)))
        .collect();

    let locations: Vec<Coordinate> = near.iter().map(|(s, _)| s.location).collect();
    let to_end = many_to_one(provider, &locations, end, TravelMode::Drive, batch).await;

    let mut passable: Vec<PassableStation> = near
        .iter()
        .zip(to_end)
        .filter_map(|((s, t1), t2)| {
            let t2 = t2?;
            (t1.saturating_add(t2) < limit).then_some(PassableStation {
                station: s.id,
                from_start_secs: *t1,
                to_end_secs: t2,
            })
        })
        .collect();
    passable.sort_by_key(|p| (p.from_start_secs, p.station));

    debug!(
        direct_secs,
        limit,
        candidates = candidates.len(),
        near = near.len(),
        passable = passable.len(),
        "car corridor"
    );

    Ok(Some(CarCorridor {
        direct_secs,
        stations: passable,
    }))
}

/// Adds the car's rides to the scope.
///
/// One connection from `car_start` to `car_end` for the whole drive, and
/// for every passable station one from `car_start` to it and one from it
/// to `car_end`. Every connection is its own trip.
pub fn insert_car_legs(
    scope: &mut TimetableScope<'_>,
    car_start: StationId,
    car_end: StationId,
    departure: DayTime,
    corridor: &CarCorridor,
) -> Result<(), TimetableError> {
    scope.add_synthetic_connection(
        TripKind::Car,
        car_start,
        car_end,
        departure,
        corridor.direct_secs,
    )?;

    for p in &corridor.stations {
        scope.add_synthetic_connection(
            TripKind::Car,
            car_start,
            p.station,
            departure,
            p.from_start_secs,
        )?;
        scope.add_synthetic_connection(
            TripKind::Car,
            p.station,
            car_end,
            departure.saturating_add_secs(p.from_start_secs),
            p.to_end_secs,
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::METERS_PER_DEGREE;
    use crate::timetable::testing::TestFeed;
    use crate::travel::StraightLineProvider;

    fn km_east(km: f64) -> f64 {
        34.0 + km * 1000.0 / METERS_PER_DEGREE
    }

    fn km_north(km: f64) -> f64 {
        32.0 + km * 1000.0 / METERS_PER_DEGREE
    }

    #[tokio::test]
    async fn stations_near_route_pass() {
        // Car drives 10 km east at 10 m/s with no detour: 1000 s
        let provider = StraightLineProvider::default().with_detour_factor(1.0);
        let tt = TestFeed::new()
            .station("ON_ROUTE", km_east(5.0), km_north(0.0))
            .station("SLIGHT_DETOUR", km_east(3.0), km_north(0.5))
            .station("FAR_NORTH", km_east(5.0), km_north(5.0))
            .station("BEHIND", km_east(-3.0), km_north(0.0))
            .build();
        let start = Coordinate::new(km_east(0.0), km_north(0.0));
        let end = Coordinate::new(km_east(10.0), km_north(0.0));

        let corridor = passable_stations(&provider, tt.stations(), start, end, 300, 10)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(corridor.direct_secs, 1000);
        let codes: Vec<_> = corridor
            .stations
            .iter()
            .map(|p| tt.station(p.station).unwrap().code.as_str())
            .collect();
        assert_eq!(codes, vec!["SLIGHT_DETOUR", "ON_ROUTE"]);
        for p in &corridor.stations {
            assert!(p.from_start_secs + p.to_end_secs < 1300);
        }
    }

    #[tokio::test]
    async fn unroutable_car() {
        let provider = StraightLineProvider::default().with_max_distance(100.0);
        let tt = TestFeed::new().station("A", 34.0, 32.0).build();

        let corridor = passable_stations(
            &provider,
            tt.stations(),
            Coordinate::new(34.0, 32.0),
            Coordinate::new(34.5, 32.0),
            300,
            10,
        )
        .await
        .unwrap();

        assert!(corridor.is_none());
    }

    #[test]
    fn car_legs_have_own_trips() {
        let tt = TestFeed::new()
            .station("A", 34.0, 32.0)
            .station("B", 34.1, 32.0)
            .build();
        let a = tt.station_by_code("A").unwrap().id;
        let b = tt.station_by_code("B").unwrap().id;
        let mut scope = tt.scope();
        let car_start = scope
            .add_synthetic_station(Coordinate::new(33.9, 32.0), "car start")
            .unwrap();
        let car_end = scope.add_synthetic_station(Coordinate::new(34.2, 32.0), "car end").unwrap();
        let departure = DayTime::parse("08:00:00").unwrap();
        let corridor = CarCorridor {
            direct_secs: 900,
            stations: vec![
                PassableStation {
                    station: a,
                    from_start_secs: 200,
                    to_end_secs: 800,
                },
                PassableStation {
                    station: b,
                    from_start_secs: 600,
                    to_end_secs: 350,
                },
            ],
        };

        insert_car_legs(&mut scope, car_start, car_end, departure, &corridor).unwrap();

        assert_eq!(scope.synthetic_connection_count(), 5);
        let pickup: Vec<_> = scope.connections_from(b, departure).copied().collect();
        assert_eq!(pickup.len(), 1);
        assert_eq!(pickup[0].departure_time, DayTime::parse("08:10:00").unwrap());
        assert_eq!(pickup[0].arrival_station, car_end);

        let from_start: std::collections::HashSet<_> = scope
            .connections_from(car_start, departure)
            .map(|c| c.trip_id)
            .collect();
        assert_eq!(from_start.len(), 3);
    }
}
