//! Polygon masking: null out range values outside a region.

mod polygon;

pub use polygon::{ensure_clockwise_polygon, is_clockwise, pnpoly, PolygonClassifier};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use coverage_common::{CoverageError, CoverageResult, PolygonCoords};

use crate::coverage::{CoverageRef, GridIndex, Range};
use crate::transform::{map_range, RangeMapFn};

/// A GeoJSON Polygon or MultiPolygon geometry.
///
/// Positions are (x, y) pairs in the coverage's native CRS coordinates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum PolygonGeometry {
    /// A single polygon: exterior ring first, then hole rings.
    Polygon { coordinates: PolygonCoords },
    /// A set of polygons.
    MultiPolygon { coordinates: Vec<PolygonCoords> },
}

impl PolygonGeometry {
    /// Normalize to a list of polygons.
    pub fn to_polygons(&self) -> Vec<PolygonCoords> {
        match self {
            PolygonGeometry::Polygon { coordinates } => vec![coordinates.clone()],
            PolygonGeometry::MultiPolygon { coordinates } => coordinates.clone(),
        }
    }
}

/// A copy of the given coverage where range values of grid cells outside
/// the polygon(s) are returned as `None`.
///
/// `axes` names the grid axes corresponding to the polygon's x and y
/// coordinate components. The inside/outside classification is
/// precomputed once per `(x, y)` grid cell pair, the engine's one eager
/// materialization; range access stays lazy.
pub async fn mask_by_polygon(
    cov: CoverageRef,
    geometry: &PolygonGeometry,
    axes: [&str; 2],
) -> CoverageResult<CoverageRef> {
    let classifier = PolygonClassifier::new(geometry.to_polygons());

    let [x_key, y_key] = axes;
    let domain = cov.load_domain().await?;
    let x = grid_axis_values(&domain, x_key)?;
    let y = grid_axis_values(&domain, y_key)?;

    let mut bitmap = Vec::with_capacity(x.len() * y.len());
    for &xi in x {
        for &yj in y {
            bitmap.push(classifier.contains(xi, yj));
        }
    }
    debug!(
        cells = bitmap.len(),
        inside = bitmap.iter().filter(|&&b| b).count(),
        "precomputed polygon mask"
    );

    let bitmap = Arc::new(bitmap);
    let y_len = y.len();
    let x_key = x_key.to_string();
    let y_key = y_key.to_string();
    let mask_fn: RangeMapFn = Arc::new(move |index: &GridIndex, range: &dyn Range| {
        let i = index.get(&x_key).copied().unwrap_or(0);
        let j = index.get(&y_key).copied().unwrap_or(0);
        if bitmap.get(i * y_len + j).copied().unwrap_or(false) {
            range.get(index)
        } else {
            None
        }
    });

    let keys: Vec<String> = cov.parameters().keys().cloned().collect();
    let mut masked = cov;
    for key in keys {
        masked = map_range(masked, &key, Arc::clone(&mask_fn), None);
    }
    Ok(masked)
}

fn grid_axis_values<'a>(
    domain: &'a coverage_common::Domain,
    key: &str,
) -> CoverageResult<&'a [f64]> {
    domain
        .axis(key)
        .ok_or_else(|| CoverageError::InvalidArgument(format!("domain has no axis '{key}'")))?
        .values
        .as_numbers()
        .ok_or_else(|| CoverageError::InvalidArgument(format!("axis '{key}' is not numeric")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_normalization() {
        let ring = vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]];
        let polygon = PolygonGeometry::Polygon {
            coordinates: vec![ring.clone()],
        };
        assert_eq!(polygon.to_polygons(), vec![vec![ring]]);
    }

    #[test]
    fn test_geometry_deserialization() {
        let geojson = r#"{
            "type": "MultiPolygon",
            "coordinates": [
                [[[-1,55],[21,55],[21,51],[-1,51],[-1,55]]],
                [[[15,51],[35,51],[35,47],[15,47],[15,51]]]
            ]
        }"#;
        let geometry: PolygonGeometry = serde_json::from_str(geojson).unwrap();
        assert_eq!(geometry.to_polygons().len(), 2);
    }
}
