//! The elementary timetable edge.

use serde::{Deserialize, Serialize};

use super::{DayTime, StationId, TripId};

/// One movement between two consecutive stops of a single trip.
///
/// Connections are immutable values. Invariant: `arrival_time >=
/// departure_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub departure_station: StationId,
    pub arrival_station: StationId,
    pub departure_time: DayTime,
    pub arrival_time: DayTime,
    pub trip_id: TripId,
}

impl Connection {
    /// Create a new connection.
    pub fn new(
        departure_station: StationId,
        arrival_station: StationId,
        departure_time: DayTime,
        arrival_time: DayTime,
        trip_id: TripId,
    ) -> Self {
        Self {
            departure_station,
            arrival_station,
            departure_time,
            arrival_time,
            trip_id,
        }
    }

    /// Travel time of this connection in seconds.
    pub fn duration_secs(&self) -> u32 {
        self.arrival_time.secs_since(self.departure_time)
    }

    /// Returns true if the connection respects `arrival >= departure`.
    pub fn is_consistent(&self) -> bool {
        self.arrival_time >= self.departure_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_and_consistency() {
        let c = Connection::new(
            StationId(0),
            StationId(1),
            DayTime::from_hms(10, 0, 0),
            DayTime::from_hms(10, 20, 0),
            TripId(0),
        );
        assert_eq!(c.duration_secs(), 1200);
        assert!(c.is_consistent());

        let backwards = Connection {
            arrival_time: DayTime::from_hms(9, 0, 0),
            ..c
        };
        assert!(!backwards.is_consistent());
        assert_eq!(backwards.duration_secs(), 0);
    }
}
