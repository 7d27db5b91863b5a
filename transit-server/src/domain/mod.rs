//! Domain types for the transit journey planner.
//!
//! This module contains the core model: stations, trips, the connections
//! that make up a timetable, and the journeys reconstructed from a search.
//! Types that carry invariants check them at construction time.

mod connection;
mod error;
mod journey;
mod station;
mod time;
mod trip;

pub use connection::Connection;
pub use error::DomainError;
pub use journey::{Journey, Leg, LegMode, Segment, Walk};
pub use station::{Coordinate, Station, StationId, StationKind};
pub use time::{DayTime, TimeError};
pub use trip::{Route, RouteId, Trip, TripId, TripKind};
