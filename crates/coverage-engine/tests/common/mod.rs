//! Shared fixtures for the engine integration tests.

use std::sync::Arc;

use coverage_engine::{
    ArrayCoverage, Axis, CoverageRef, Domain, GridIndex, Parameter, ReferenceSystem,
    ReferenceSystemConnection,
};
use coverage_projection::CRS84;

pub fn crs84() -> ReferenceSystem {
    ReferenceSystem::Geodetic {
        id: Some(CRS84.to_string()),
    }
}

/// A 4x4 geodetic grid: y = [54, 52, 50, 48], x = [0, 10, 20, 30].
pub fn grid_domain() -> Domain {
    Domain::new(
        Some("Grid".to_string()),
        vec![
            Axis::primitive("y", vec![54.0, 52.0, 50.0, 48.0]),
            Axis::primitive("x", vec![0.0, 10.0, 20.0, 30.0]),
        ],
        vec![ReferenceSystemConnection::new(
            vec!["x".to_string(), "y".to_string()],
            crs84(),
        )],
    )
    .unwrap()
}

/// Row-major (y outermost) temperature values over [`grid_domain`].
pub fn grid_values() -> Vec<Option<f64>> {
    [
        17.3, 18.2, 16.5, 18.7, //
        18.1, 19.4, 17.2, 18.6, //
        19.2, 20.4, 21.1, 20.7, //
        21.1, 21.3, 20.5, 19.2,
    ]
    .into_iter()
    .map(Some)
    .collect()
}

/// A single-parameter temperature coverage over [`grid_domain`].
pub fn temperature_coverage() -> CoverageRef {
    Arc::new(
        ArrayCoverage::from_grid(
            grid_domain(),
            Parameter::new("TMP", "Air temperature"),
            &["y", "x"],
            grid_values(),
        )
        .unwrap(),
    )
}

/// Index object for a cell of the grid coverage.
pub fn cell(x: usize, y: usize) -> GridIndex {
    let mut index = GridIndex::new();
    index.insert("x".to_string(), x);
    index.insert("y".to_string(), y);
    index
}
