//! Offline job: computes walking footpaths between nearby stations and
//! writes them as a JSON table.
//!
//! Reads `TRANSIT_SNAPSHOT` for the feed and `FOOTPATHS_OUT` for the output
//! file. Walking times come from the Valhalla service at `VALHALLA_URL`;
//! without it, straight-line estimates are used.

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use transit_server::footpaths::{FootpathConfig, FootpathTable, build_station_footpaths};
use transit_server::spatial::SpatialIndex;
use transit_server::timetable::{FeedSnapshot, Timetable};
use transit_server::travel::{
    StraightLineProvider, TravelTimeProvider, ValhallaClient, ValhallaConfig,
};

const DEFAULT_SNAPSHOT: &str = "feed.json";
const DEFAULT_OUT: &str = "footpaths.json";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let snapshot_path =
        std::env::var("TRANSIT_SNAPSHOT").unwrap_or_else(|_| DEFAULT_SNAPSHOT.to_string());
    let out = std::env::var("FOOTPATHS_OUT").unwrap_or_else(|_| DEFAULT_OUT.to_string());

    let timetable = Timetable::from_snapshot(FeedSnapshot::load(&snapshot_path)?)?;
    let index = SpatialIndex::with_default_width(timetable.stations().to_vec());
    let config = FootpathConfig::default();
    info!(
        path = %snapshot_path,
        stations = timetable.station_count(),
        radius_m = config.radius_m,
        "computing footpaths"
    );

    let table = match std::env::var("VALHALLA_URL") {
        Ok(url) => {
            let client = ValhallaClient::new(ValhallaConfig::new(url))?;
            build(&timetable, &index, &client, &config).await
        }
        Err(_) => {
            warn!("VALHALLA_URL not set, using straight-line walking estimates");
            build(&timetable, &index, &StraightLineProvider::default(), &config).await
        }
    };

    table.save(&out)?;
    info!(path = %out, footpaths = table.len(), "footpath table written");
    Ok(())
}

async fn build<P: TravelTimeProvider>(
    timetable: &Timetable,
    index: &SpatialIndex,
    provider: &P,
    config: &FootpathConfig,
) -> FootpathTable {
    build_station_footpaths(timetable.stations(), index, provider, config).await
}
