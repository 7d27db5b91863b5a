//! Test helpers for building small feeds.

use std::sync::Arc;

use super::{FeedSnapshot, StationRecord, StopTimeRecord, Timetable, TripRecord};
use crate::domain::{DayTime, Route};

/// Builder for hand-written test feeds.
///
/// Stops are given as `(station code, time)`; arrival and departure are the
/// same at every stop.
#[derive(Default)]
pub(crate) struct TestFeed {
    snapshot: FeedSnapshot,
}

impl TestFeed {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn station(mut self, code: &str, lon: f64, lat: f64) -> Self {
        self.snapshot.stations.push(StationRecord {
            id: code.to_string(),
            name: format!("Station {code}"),
            lon,
            lat,
        });
        self
    }

    pub(crate) fn route(mut self, code: &str, short_name: &str) -> Self {
        self.snapshot.routes.push(Route {
            code: code.to_string(),
            short_name: short_name.to_string(),
            long_name: String::new(),
            agency: None,
            color: None,
        });
        self
    }

    pub(crate) fn trip(mut self, id: &str, route: Option<&str>, stops: &[(&str, &str)]) -> Self {
        let stop_times = stops
            .iter()
            .map(|(station, time)| {
                let t = DayTime::parse(time).unwrap();
                StopTimeRecord {
                    station: station.to_string(),
                    arrival: t,
                    departure: t,
                }
            })
            .collect();
        self.snapshot.trips.push(TripRecord {
            id: id.to_string(),
            route: route.map(str::to_string),
            stop_times,
        });
        self
    }

    pub(crate) fn snapshot(self) -> FeedSnapshot {
        self.snapshot
    }

    pub(crate) fn build(self) -> Arc<Timetable> {
        Arc::new(Timetable::from_snapshot(self.snapshot).unwrap())
    }
}
