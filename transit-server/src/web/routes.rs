//! HTTP route handlers.

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::domain::Coordinate;
use crate::planner::PlanError;
use crate::spatial::planar_distance_m;

use super::dto::*;
use super::state::AppState;

/// Default radius for nearby-station lookups (metres).
const DEFAULT_NEARBY_RADIUS_M: f64 = 500.0;

/// Largest radius a nearby-station lookup may ask for (metres).
const MAX_NEARBY_RADIUS_M: f64 = 5000.0;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/journey/plan", post(plan_journey))
        .route("/journey/stations", get(plan_station_journey))
        .route("/stations", get(stations_in_bounds))
        .route("/stations/nearby", get(nearby_stations))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Plan journeys between two points.
async fn plan_journey(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PlanJourneyResponse>, AppError> {
    let req: PlanJourneyRequest =
        serde_json::from_slice(&body).map_err(|e| AppError::BadRequest {
            message: format!("Invalid request: {e}"),
        })?;
    let query = req.into_query();

    let plan = state.planner.find_routes(&query).await?;
    info!(
        departure = %query.departure,
        car = query.car.is_some(),
        journeys = plan.journeys.len(),
        "journey planned"
    );

    Ok(Json(PlanJourneyResponse::from_plan(&plan)))
}

/// Plan journeys between two timetable stations, by code.
async fn plan_station_journey(
    State(state): State<AppState>,
    Query(req): Query<StationJourneyRequest>,
) -> Result<Json<PlanJourneyResponse>, AppError> {
    let timetable = state.planner.timetable();
    let lookup = |code: &str| {
        timetable
            .station_by_code(code)
            .map(|s| s.id)
            .ok_or_else(|| AppError::NotFound {
                message: format!("Unknown station: {code}"),
            })
    };
    let from = lookup(&req.from)?;
    let to = lookup(&req.to)?;

    let journeys = state
        .planner
        .find_station_routes(from, to, req.departure, req.max_transfers)?;

    Ok(Json(PlanJourneyResponse::from_journeys(
        &journeys,
        timetable.as_ref(),
    )))
}

/// Stations around a point, nearest first.
async fn nearby_stations(
    State(state): State<AppState>,
    Query(req): Query<NearbyRequest>,
) -> Result<Json<StationsResponse>, AppError> {
    let point = Coordinate::new(req.lon, req.lat);
    if !point.is_valid() {
        return Err(AppError::BadRequest {
            message: "Invalid coordinate".into(),
        });
    }
    let radius = req.radius.unwrap_or(DEFAULT_NEARBY_RADIUS_M);
    if !(radius.is_finite() && radius > 0.0 && radius <= MAX_NEARBY_RADIUS_M) {
        return Err(AppError::BadRequest {
            message: format!("Radius must be between 0 and {MAX_NEARBY_RADIUS_M} metres"),
        });
    }

    // The index returns a superset; trim to the radius
    let mut found: Vec<_> = state
        .spatial
        .nearby(point, radius)
        .into_iter()
        .map(|s| (planar_distance_m(point, s.location), s))
        .filter(|(d, _)| *d <= radius)
        .collect();
    found.sort_by(|a, b| a.0.total_cmp(&b.0));

    Ok(Json(StationsResponse {
        stations: found
            .into_iter()
            .map(|(_, s)| StationResult::from_station(s))
            .collect(),
    }))
}

/// Stations inside a bounding box.
async fn stations_in_bounds(
    State(state): State<AppState>,
    Query(req): Query<BoundsRequest>,
) -> Result<Json<StationsResponse>, AppError> {
    if !req.is_valid() {
        return Err(AppError::BadRequest {
            message: "Invalid bounding box".into(),
        });
    }
    let (min, max) = req.corners();

    let stations = state
        .planner
        .timetable()
        .stations_within(min, max)
        .map(StationResult::from_station)
        .collect();

    Ok(Json(StationsResponse { stations }))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<PlanError> for AppError {
    fn from(e: PlanError) -> Self {
        if e.is_client_error() {
            AppError::BadRequest {
                message: e.to_string(),
            }
        } else {
            AppError::Internal {
                message: e.to_string(),
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
