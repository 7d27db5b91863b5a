use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use transit_server::planner::{Planner, SearchConfig};
use transit_server::spatial::SpatialIndex;
use transit_server::timetable::{FeedSnapshot, Timetable};
use transit_server::travel::{CacheConfig, CachedProvider, ValhallaClient, ValhallaConfig};
use transit_server::web::{AppState, create_router};

/// Snapshot read when `TRANSIT_SNAPSHOT` is not set.
const DEFAULT_SNAPSHOT: &str = "feed.json";

/// Address bound when `TRANSIT_ADDR` is not set.
const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let snapshot_path =
        std::env::var("TRANSIT_SNAPSHOT").unwrap_or_else(|_| DEFAULT_SNAPSHOT.to_string());
    let addr: SocketAddr = std::env::var("TRANSIT_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()?;
    let valhalla = match std::env::var("VALHALLA_URL") {
        Ok(url) => ValhallaConfig::new(url),
        Err(_) => {
            warn!("VALHALLA_URL not set, using a local Valhalla");
            ValhallaConfig::default()
        }
    };

    // Load the feed (fail fast if unavailable)
    info!(path = %snapshot_path, "loading feed snapshot");
    let timetable = Arc::new(Timetable::from_snapshot(FeedSnapshot::load(&snapshot_path)?)?);
    info!(
        stations = timetable.station_count(),
        trips = timetable.trip_count(),
        connections = timetable.connection_count(),
        "timetable loaded"
    );

    let spatial = SpatialIndex::with_default_width(timetable.stations().to_vec());

    let base_url = valhalla.base_url.clone();
    let client = ValhallaClient::new(valhalla)?;
    let provider = CachedProvider::new(client, &CacheConfig::default());
    let planner = Planner::new(timetable, provider, SearchConfig::default());

    let app = create_router(AppState::new(planner, spatial));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, valhalla = %base_url, "transit planner listening");
    info!("  GET  /health            - Health check");
    info!("  POST /journey/plan      - Plan a journey between two points");
    info!("  GET  /journey/stations  - Plan a journey between two stations");
    info!("  GET  /stations          - Stations in a bounding box");
    info!("  GET  /stations/nearby   - Stations around a point");

    axum::serve(listener, app).await?;
    Ok(())
}
