//! Valhalla API request and response types.
//!
//! Only the fields used by the planner are modelled. Valhalla reports
//! matrix distances in kilometres and isochrone contours in minutes.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

use crate::domain::Coordinate;

use super::{MatrixCell, TravelMode, TravelTimeError};

/// A location in a Valhalla request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl From<Coordinate> for Location {
    fn from(c: Coordinate) -> Self {
        Self {
            lat: c.lat,
            lon: c.lon,
        }
    }
}

/// Costing model name for a travel mode.
pub fn costing(mode: TravelMode) -> &'static str {
    match mode {
        TravelMode::Walk => "pedestrian",
        TravelMode::Drive => "auto",
    }
}

/// Body of `POST /sources_to_targets`.
#[derive(Debug, Clone, Serialize)]
pub struct MatrixRequest {
    pub sources: Vec<Location>,
    pub targets: Vec<Location>,
    pub costing: &'static str,
}

/// Response of `POST /sources_to_targets`.
#[derive(Debug, Clone, Deserialize)]
pub struct MatrixResponse {
    pub sources_to_targets: Vec<Vec<MatrixEntry>>,
}

/// One source/target pair. Unreachable pairs have null time and distance.
#[derive(Debug, Clone, Deserialize)]
pub struct MatrixEntry {
    #[serde(default)]
    pub time: Option<f64>,
    /// Kilometres.
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub to_index: Option<usize>,
}

impl MatrixResponse {
    /// Converts to a dense `sources x targets` grid.
    ///
    /// Entries are placed by `to_index` when present, by position otherwise.
    pub fn into_cells(
        self,
        sources: usize,
        targets: usize,
    ) -> Result<Vec<Vec<Option<MatrixCell>>>, TravelTimeError> {
        let rows = self.sources_to_targets;
        let shape_error = |actual_cols: usize| TravelTimeError::MatrixShape {
            expected: (sources, targets),
            actual: (rows.len(), actual_cols),
        };

        if rows.len() != sources {
            return Err(shape_error(rows.first().map_or(0, Vec::len)));
        }

        let mut grid = Vec::with_capacity(sources);
        for row in &rows {
            if row.len() != targets {
                return Err(shape_error(row.len()));
            }
            let mut cells = vec![None; targets];
            for (pos, entry) in row.iter().enumerate() {
                let idx = entry.to_index.unwrap_or(pos);
                if idx >= targets {
                    return Err(shape_error(idx + 1));
                }
                cells[idx] = entry.cell();
            }
            grid.push(cells);
        }
        Ok(grid)
    }
}

impl MatrixEntry {
    fn cell(&self) -> Option<MatrixCell> {
        let time = self.time?;
        let distance = self.distance?;
        if !(time.is_finite() && distance.is_finite()) || time < 0.0 || distance < 0.0 {
            return None;
        }
        Some(MatrixCell {
            time_secs: time.round() as u32,
            distance_m: distance * 1000.0,
        })
    }
}

/// Body of `POST /isochrone`.
#[derive(Debug, Clone, Serialize)]
pub struct IsochroneRequest {
    pub locations: Vec<Location>,
    pub costing: &'static str,
    pub contours: Vec<Contour>,
    pub polygons: bool,
}

/// One requested contour, in minutes.
#[derive(Debug, Clone, Serialize)]
pub struct Contour {
    pub time: f64,
}

/// Response of `POST /isochrone`: a GeoJSON FeatureCollection.
#[derive(Debug, Clone, Deserialize)]
pub struct IsochroneResponse {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: FeatureProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureProperties {
    /// Contour value in minutes.
    #[serde(default)]
    pub contour: Option<f64>,
}

/// The GeoJSON geometries Valhalla emits for isochrones.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<[f64; 2]>>> },
    LineString { coordinates: Vec<[f64; 2]> },
}

impl Geometry {
    /// Converts to a `geo` multipolygon. A linestring is treated as a ring.
    pub fn to_multi_polygon(&self) -> Result<MultiPolygon<f64>, TravelTimeError> {
        let polygons = match self {
            Geometry::Polygon { coordinates } => vec![polygon(coordinates)?],
            Geometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .map(|rings| polygon(rings))
                .collect::<Result<_, _>>()?,
            Geometry::LineString { coordinates } => {
                vec![Polygon::new(ring(coordinates)?, Vec::new())]
            }
        };
        Ok(MultiPolygon::new(polygons))
    }
}

fn polygon(rings: &[Vec<[f64; 2]>]) -> Result<Polygon<f64>, TravelTimeError> {
    let (exterior, interiors) = rings
        .split_first()
        .ok_or_else(|| TravelTimeError::Geometry("polygon without rings".into()))?;
    let interiors = interiors.iter().map(|r| ring(r)).collect::<Result<_, _>>()?;
    Ok(Polygon::new(ring(exterior)?, interiors))
}

fn ring(points: &[[f64; 2]]) -> Result<LineString<f64>, TravelTimeError> {
    if points.len() < 3 {
        return Err(TravelTimeError::Geometry(format!(
            "ring with {} points",
            points.len()
        )));
    }
    Ok(points
        .iter()
        .map(|[x, y]| Coord { x: *x, y: *y })
        .collect::<Vec<_>>()
        .into())
}
