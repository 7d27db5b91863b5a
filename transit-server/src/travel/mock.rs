//! Straight-line travel-time provider.
//!
//! Estimates travel times from planar distance, a detour factor and a
//! constant speed per mode. Deterministic and offline, for tests and for
//! running without a routing service.

use geo::{Coord, LineString, MultiPolygon, Polygon};

use crate::domain::Coordinate;
use crate::spatial::{METERS_PER_DEGREE, planar_distance_m};

use super::{Isochrone, Matrix, MatrixCell, TravelMode, TravelTimeError, TravelTimeProvider};

/// Number of vertices used to approximate isochrone circles.
const CIRCLE_VERTICES: usize = 32;

/// Provider that assumes travel along a straight line.
#[derive(Debug, Clone)]
pub struct StraightLineProvider {
    /// Walking speed in metres per second.
    pub walk_speed_mps: f64,
    /// Driving speed in metres per second.
    pub drive_speed_mps: f64,
    /// Ratio of network distance to straight-line distance.
    pub detour_factor: f64,
    /// Pairs further apart than this are unreachable.
    pub max_distance_m: Option<f64>,
}

impl Default for StraightLineProvider {
    fn default() -> Self {
        Self {
            walk_speed_mps: 1.25,
            drive_speed_mps: 10.0,
            detour_factor: 1.3,
            max_distance_m: None,
        }
    }
}

impl StraightLineProvider {
    /// Set the walking speed.
    pub fn with_walk_speed(mut self, mps: f64) -> Self {
        self.walk_speed_mps = mps;
        self
    }

    /// Set the driving speed.
    pub fn with_drive_speed(mut self, mps: f64) -> Self {
        self.drive_speed_mps = mps;
        self
    }

    /// Set the detour factor.
    pub fn with_detour_factor(mut self, factor: f64) -> Self {
        self.detour_factor = factor;
        self
    }

    /// Make pairs beyond `metres` unreachable.
    pub fn with_max_distance(mut self, metres: f64) -> Self {
        self.max_distance_m = Some(metres);
        self
    }

    fn speed(&self, mode: TravelMode) -> f64 {
        match mode {
            TravelMode::Walk => self.walk_speed_mps,
            TravelMode::Drive => self.drive_speed_mps,
        }
    }

    /// Estimated time and distance between two points.
    pub fn estimate(&self, from: Coordinate, to: Coordinate, mode: TravelMode) -> Option<MatrixCell> {
        let straight = planar_distance_m(from, to);
        if self.max_distance_m.is_some_and(|max| straight > max) {
            return None;
        }
        let distance_m = straight * self.detour_factor;
        Some(MatrixCell {
            time_secs: (distance_m / self.speed(mode)).round() as u32,
            distance_m,
        })
    }
}

impl TravelTimeProvider for StraightLineProvider {
    async fn matrix(
        &self,
        sources: &[Coordinate],
        targets: &[Coordinate],
        mode: TravelMode,
    ) -> Result<Matrix, TravelTimeError> {
        Ok(sources
            .iter()
            .map(|s| targets.iter().map(|t| self.estimate(*s, *t, mode)).collect())
            .collect())
    }

    async fn isochrone(
        &self,
        origin: Coordinate,
        thresholds_secs: &[u32],
        mode: TravelMode,
    ) -> Result<Vec<Isochrone>, TravelTimeError> {
        Ok(thresholds_secs
            .iter()
            .map(|secs| {
                let mut radius_m = *secs as f64 * self.speed(mode) / self.detour_factor;
                if let Some(max) = self.max_distance_m {
                    radius_m = radius_m.min(max);
                }
                Isochrone {
                    threshold_secs: *secs,
                    area: MultiPolygon::new(vec![circle(origin, radius_m)]),
                }
            })
            .collect())
    }
}

/// Regular polygon approximating a circle, in the planar projection.
fn circle(center: Coordinate, radius_m: f64) -> Polygon<f64> {
    let r = radius_m / METERS_PER_DEGREE;
    let points: Vec<Coord<f64>> = (0..=CIRCLE_VERTICES)
        .map(|i| {
            let angle = std::f64::consts::TAU * (i % CIRCLE_VERTICES) as f64 / CIRCLE_VERTICES as f64;
            Coord {
                x: center.lon + r * angle.cos(),
                y: center.lat + r * angle.sin(),
            }
        })
        .collect();
    Polygon::new(LineString::from(points), Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn matrix_times_scale_with_distance() {
        let provider = StraightLineProvider::default().with_detour_factor(1.0);
        let origin = Coordinate::new(34.78, 32.08);
        // ~111 m and ~222 m north
        let near = Coordinate::new(34.78, 32.081);
        let far = Coordinate::new(34.78, 32.082);

        let m = provider
            .matrix(&[origin], &[near, far], TravelMode::Walk)
            .await
            .unwrap();
        let near_t = m[0][0].unwrap().time_secs;
        let far_t = m[0][1].unwrap().time_secs;
        assert_eq!(near_t, (111.32_f64 / 1.25).round() as u32);
        assert!(far_t > near_t);

        let drive = provider
            .matrix(&[origin], &[far], TravelMode::Drive)
            .await
            .unwrap();
        assert!(drive[0][0].unwrap().time_secs < far_t);
    }

    #[tokio::test]
    async fn max_distance_makes_unreachable() {
        let provider = StraightLineProvider::default().with_max_distance(150.0);
        let origin = Coordinate::new(34.78, 32.08);
        let m = provider
            .matrix(
                &[origin],
                &[Coordinate::new(34.78, 32.081), Coordinate::new(34.78, 32.09)],
                TravelMode::Walk,
            )
            .await
            .unwrap();
        assert!(m[0][0].is_some());
        assert!(m[0][1].is_none());
    }

    #[tokio::test]
    async fn isochrones_nest() {
        let provider = StraightLineProvider::default();
        let origin = Coordinate::new(34.78, 32.08);
        let isos = provider
            .isochrone(origin, &[300, 600], TravelMode::Drive)
            .await
            .unwrap();
        assert_eq!(isos.len(), 2);
        assert_eq!(isos[0].threshold_secs, 300);

        // 300 s at 10 m/s over 1.3 detour is ~2.3 km
        let two_km = Coordinate::new(34.78, 32.08 + 2000.0 / METERS_PER_DEGREE);
        let three_km = Coordinate::new(34.78, 32.08 + 3000.0 / METERS_PER_DEGREE);
        assert!(isos[0].contains(origin));
        assert!(isos[0].contains(two_km));
        assert!(!isos[0].contains(three_km));
        assert!(isos[1].contains(three_km));
    }
}
