//! Planner error types.

use crate::domain::{DomainError, StationId};
use crate::timetable::TimetableError;

/// Error from journey planning.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The request can't be answered as asked
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The search left no label where reconstruction needs one
    #[error("no label for {station} at round {level}")]
    MissingLabel { station: StationId, level: usize },

    /// Timetable lookup failed during search or reconstruction
    #[error(transparent)]
    Timetable(#[from] TimetableError),

    /// Reconstructed journey was malformed
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl PlanError {
    /// Returns true if the caller asked for something impossible, as
    /// opposed to the planner failing.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PlanError::InvalidRequest(_))
    }
}
