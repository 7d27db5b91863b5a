//! Search configuration for the journey planner.

use chrono::Duration;

/// Configuration parameters for journey search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Transfers allowed when a query doesn't say.
    pub max_transfers: usize,

    /// Maximum walking time for the first and last mile (seconds).
    /// Stations further than this from the origin or destination are not
    /// used.
    pub max_walk_secs: u32,

    /// Frontier stations whose arrival is later than the best known target
    /// time plus this slack are not expanded (seconds).
    pub slack_secs: u32,

    /// Maximum number of locations sent in one matrix request.
    pub max_matrix_targets: usize,

    /// Detour a driver accepts over the fastest route when no offer says
    /// otherwise (seconds).
    pub car_deviation_secs: u32,

    /// Start the initial walk as late as possible without missing the
    /// first vehicle.
    pub optimize_departure: bool,
}

impl SearchConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(
        max_transfers: usize,
        max_walk_secs: u32,
        slack_secs: u32,
        max_matrix_targets: usize,
        car_deviation_secs: u32,
        optimize_departure: bool,
    ) -> Self {
        Self {
            max_transfers,
            max_walk_secs,
            slack_secs,
            max_matrix_targets,
            car_deviation_secs,
            optimize_departure,
        }
    }

    /// Set the default number of transfers.
    pub fn with_max_transfers(mut self, n: usize) -> Self {
        self.max_transfers = n;
        self
    }

    /// Set the walking cap.
    pub fn with_max_walk_secs(mut self, secs: u32) -> Self {
        self.max_walk_secs = secs;
        self
    }

    /// Set the matrix batch size.
    pub fn with_max_matrix_targets(mut self, n: usize) -> Self {
        self.max_matrix_targets = n;
        self
    }

    /// Set the default car deviation.
    pub fn with_car_deviation_secs(mut self, secs: u32) -> Self {
        self.car_deviation_secs = secs;
        self
    }

    /// Enable or disable departure-time optimisation.
    pub fn with_optimize_departure(mut self, on: bool) -> Self {
        self.optimize_departure = on;
        self
    }

    /// Returns the walking cap as a Duration.
    pub fn max_walk(&self) -> Duration {
        Duration::seconds(self.max_walk_secs as i64)
    }

    /// Returns the default car deviation as a Duration.
    pub fn car_deviation(&self) -> Duration {
        Duration::seconds(self.car_deviation_secs as i64)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_transfers: 3,
            max_walk_secs: 15 * 60,
            slack_secs: 0,
            max_matrix_targets: 500,
            car_deviation_secs: 5 * 60,
            optimize_departure: true,
        }
    }
}
