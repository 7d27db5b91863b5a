//! Domain error types.
//!
//! These errors represent inconsistencies when assembling journeys from
//! search output. They are distinct from timetable and provider errors.

use super::{DayTime, StationId};

/// Domain-level errors for journey construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// A leg was built from an empty connection list
    #[error("leg must have at least one connection")]
    EmptyLeg,

    /// A leg's connections don't chain station to station
    #[error("leg connections do not chain: {0} then {1}")]
    BrokenLeg(StationId, StationId),

    /// Consecutive segments don't share a station
    #[error("segments do not connect: {0} then {1}")]
    Disconnected(StationId, StationId),

    /// A segment departs before the previous one arrives
    #[error("segment departs at {departure} before previous arrival at {arrival}")]
    DepartsBeforeArrival { departure: DayTime, arrival: DayTime },

    /// Journey has no segments
    #[error("journey must have at least one segment")]
    EmptyJourney,
}
