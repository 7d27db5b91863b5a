//! Application state for the web layer.

use std::sync::Arc;

use crate::planner::Planner;
use crate::spatial::SpatialIndex;
use crate::travel::{CachedProvider, ValhallaClient};

/// The provider the server plans with.
pub type ServerProvider = CachedProvider<ValhallaClient>;

/// Shared application state.
///
/// Contains all the services needed to handle requests. The timetable is
/// reached through the planner.
#[derive(Clone)]
pub struct AppState {
    /// Journey planner over the loaded feed
    pub planner: Arc<Planner<ServerProvider>>,

    /// Spatial index over the feed's stations
    pub spatial: Arc<SpatialIndex>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(planner: Planner<ServerProvider>, spatial: SpatialIndex) -> Self {
        Self {
            planner: Arc::new(planner),
            spatial: Arc::new(spatial),
        }
    }
}
