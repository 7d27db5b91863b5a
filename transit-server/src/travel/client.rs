//! Valhalla HTTP client.
//!
//! Provides async methods for the `sources_to_targets` matrix and
//! `isochrone` endpoints of a Valhalla-compatible routing service.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tracing::{debug, trace};

use crate::domain::Coordinate;

use super::error::TravelTimeError;
use super::types::{
    Contour, Feature, IsochroneRequest, IsochroneResponse, Location, MatrixRequest,
    MatrixResponse, costing,
};
use super::{Isochrone, Matrix, TravelMode, TravelTimeProvider};

/// Default base URL for a local Valhalla instance.
const DEFAULT_BASE_URL: &str = "http://localhost:8002";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Configuration for the Valhalla client.
#[derive(Debug, Clone)]
pub struct ValhallaConfig {
    /// Base URL of the service
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ValhallaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 30,
        }
    }
}

impl ValhallaConfig {
    /// Create a config pointing at the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Valhalla API client.
///
/// Uses a semaphore to bound concurrent requests to the service.
#[derive(Debug, Clone)]
pub struct ValhallaClient {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
}

impl ValhallaClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ValhallaConfig) -> Result<Self, TravelTimeError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    /// POST a JSON body and parse the JSON response.
    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, TravelTimeError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| TravelTimeError::ApiError {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let url = format!("{}/{}", self.base_url, path);
        trace!(%url, "valhalla request");

        let response = self.http.post(&url).json(body).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TravelTimeError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TravelTimeError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|source| TravelTimeError::Json {
            source,
            body: Some(body.chars().take(500).collect()),
        })
    }
}

impl TravelTimeProvider for ValhallaClient {
    async fn matrix(
        &self,
        sources: &[Coordinate],
        targets: &[Coordinate],
        mode: TravelMode,
    ) -> Result<Matrix, TravelTimeError> {
        if sources.is_empty() || targets.is_empty() {
            return Ok(vec![Vec::new(); sources.len()]);
        }

        let request = MatrixRequest {
            sources: sources.iter().copied().map(Location::from).collect(),
            targets: targets.iter().copied().map(Location::from).collect(),
            costing: costing(mode),
        };
        let response: MatrixResponse = self.post("sources_to_targets", &request).await?;

        debug!(
            sources = sources.len(),
            targets = targets.len(),
            ?mode,
            "matrix fetched"
        );
        response.into_cells(sources.len(), targets.len())
    }

    async fn isochrone(
        &self,
        origin: Coordinate,
        thresholds_secs: &[u32],
        mode: TravelMode,
    ) -> Result<Vec<Isochrone>, TravelTimeError> {
        if thresholds_secs.is_empty() {
            return Ok(Vec::new());
        }

        let request = IsochroneRequest {
            locations: vec![origin.into()],
            costing: costing(mode),
            contours: thresholds_secs
                .iter()
                .map(|secs| Contour {
                    time: *secs as f64 / 60.0,
                })
                .collect(),
            polygons: true,
        };
        let response: IsochroneResponse = self.post("isochrone", &request).await?;

        debug!(
            contours = thresholds_secs.len(),
            features = response.features.len(),
            ?mode,
            "isochrone fetched"
        );
        match_contours(thresholds_secs, &response.features)
    }
}

/// Pairs each requested threshold with its feature.
///
/// Features are matched by their `contour` property when every feature
/// carries one, and by position otherwise.
fn match_contours(
    thresholds_secs: &[u32],
    features: &[Feature],
) -> Result<Vec<Isochrone>, TravelTimeError> {
    if features.len() != thresholds_secs.len() {
        return Err(TravelTimeError::Geometry(format!(
            "expected {} contours, got {}",
            thresholds_secs.len(),
            features.len()
        )));
    }

    let by_contour = features.iter().all(|f| f.properties.contour.is_some());

    thresholds_secs
        .iter()
        .enumerate()
        .map(|(i, secs)| {
            let minutes = *secs as f64 / 60.0;
            let feature = if by_contour {
                features
                    .iter()
                    .find(|f| {
                        f.properties
                            .contour
                            .is_some_and(|c| (c - minutes).abs() < 1e-3)
                    })
                    .ok_or_else(|| {
                        TravelTimeError::Geometry(format!("no contour for {minutes} minutes"))
                    })?
            } else {
                &features[i]
            };
            Ok(Isochrone {
                threshold_secs: *secs,
                area: feature.geometry.to_multi_polygon()?,
            })
        })
        .collect()
}
