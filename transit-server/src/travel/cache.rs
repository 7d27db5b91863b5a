//! Caching layer for travel-time responses.
//!
//! Station coordinates never change and the first/last-mile matrices of
//! nearby queries repeat often, so responses are cached keyed by the
//! request's coordinates rounded to a fixed precision (about a metre at the
//! default) plus the travel mode.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::trace;

use crate::domain::Coordinate;

use super::{Isochrone, Matrix, TravelMode, TravelTimeError, TravelTimeProvider};

/// Rounded coordinate used in cache keys.
type PointKey = (i64, i64);

/// Cache key for matrices: (mode, sources, targets).
type MatrixKey = (TravelMode, Vec<PointKey>, Vec<PointKey>);

/// Cache key for isochrones: (mode, origin, thresholds).
type IsochroneKey = (TravelMode, PointKey, Vec<u32>);

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries per kind.
    pub max_capacity: u64,

    /// Coordinates are rounded to `1 / scale` degrees.
    pub scale: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60 * 60),
            max_capacity: 10_000,
            scale: 1e5,
        }
    }
}

impl CacheConfig {
    /// Set the time to live.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the maximum number of entries.
    pub fn with_max_capacity(mut self, n: u64) -> Self {
        self.max_capacity = n;
        self
    }
}

/// Travel-time provider with caching.
///
/// Wraps any provider and caches successful responses. Failures are not
/// cached.
pub struct CachedProvider<P> {
    inner: P,
    matrices: MokaCache<MatrixKey, Arc<Matrix>>,
    isochrones: MokaCache<IsochroneKey, Arc<Vec<Isochrone>>>,
    scale: f64,
}

impl<P: TravelTimeProvider> CachedProvider<P> {
    /// Create a new cached provider.
    pub fn new(inner: P, config: &CacheConfig) -> Self {
        let matrices = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();
        let isochrones = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self {
            inner,
            matrices,
            isochrones,
            scale: config.scale,
        }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn point_key(&self, c: Coordinate) -> PointKey {
        (
            (c.lon * self.scale).round() as i64,
            (c.lat * self.scale).round() as i64,
        )
    }

    fn points_key(&self, points: &[Coordinate]) -> Vec<PointKey> {
        points.iter().map(|c| self.point_key(*c)).collect()
    }
}

impl<P: TravelTimeProvider> TravelTimeProvider for CachedProvider<P> {
    async fn matrix(
        &self,
        sources: &[Coordinate],
        targets: &[Coordinate],
        mode: TravelMode,
    ) -> Result<Matrix, TravelTimeError> {
        let key = (mode, self.points_key(sources), self.points_key(targets));

        // Try cache first
        if let Some(cached) = self.matrices.get(&key).await {
            trace!(sources = sources.len(), targets = targets.len(), "matrix cache hit");
            return Ok(cached.as_ref().clone());
        }

        let matrix = self.inner.matrix(sources, targets, mode).await?;
        self.matrices.insert(key, Arc::new(matrix.clone())).await;
        Ok(matrix)
    }

    async fn isochrone(
        &self,
        origin: Coordinate,
        thresholds_secs: &[u32],
        mode: TravelMode,
    ) -> Result<Vec<Isochrone>, TravelTimeError> {
        let key = (mode, self.point_key(origin), thresholds_secs.to_vec());

        if let Some(cached) = self.isochrones.get(&key).await {
            trace!("isochrone cache hit");
            return Ok(cached.as_ref().clone());
        }

        let isochrones = self.inner.isochrone(origin, thresholds_secs, mode).await?;
        self.isochrones
            .insert(key, Arc::new(isochrones.clone()))
            .await;
        Ok(isochrones)
    }
}
