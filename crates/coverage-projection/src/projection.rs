//! Projections between geodetic lon/lat and projected x/y coordinates.
//!
//! Domains referenced to one of the known geodetic CRSs get a built-in
//! longitude-wrapping projection derived from the domain's own longitude
//! extent. Any other CRS is served from a process-wide cache populated
//! through the explicit async load path.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use tracing::debug;

use coverage_common::{AxisValues, CoverageError, CoverageResult, Domain};

use crate::crs::{is_ellipsoidal_crs, longitude_axis_index};
use crate::referencing::{find_horizontal_crs, LongitudeWrapper};

/// A geodetic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

/// A projected position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Xy {
    pub x: f64,
    pub y: f64,
}

/// Converts between geodetic lat/lon and projected x/y values.
pub trait Projection: Send + Sync {
    /// Project a geodetic position to x/y.
    fn project(&self, pos: LonLat) -> Xy;

    /// Recover the geodetic position of an x/y value.
    fn unproject(&self, pos: Xy) -> LonLat;
}

/// Shared handle to a projection.
pub type ProjectionRef = Arc<dyn Projection>;

/// Reproject a position from one projection into another.
pub fn reproject_coords(pos: Xy, from: &dyn Projection, to: &dyn Projection) -> Xy {
    to.project(from.unproject(pos))
}

/// The built-in projection for geodetic lat/lon CRSs.
///
/// An input lon/lat position gets projected by wrapping the longitude into
/// the longitude window used by the domain, e.g. [0, 360], making
/// intercomparison between coverages with different longitude conventions
/// possible. Unprojecting is the identity up to axis order.
#[derive(Debug, Clone)]
pub struct LonLatProjection {
    wrapper: LongitudeWrapper,
    lon_index: usize,
}

impl LonLatProjection {
    /// Derive the projection from a domain's geodetic referencing entry.
    ///
    /// Scans the domain's longitude component values (primitive axis
    /// values directly, composite tuple or polygon values at the longitude
    /// component position) to find the extent of the wrapping window.
    pub fn from_domain(domain: &Domain) -> CoverageResult<Self> {
        let connection = domain
            .referencing
            .iter()
            .find(|c| is_ellipsoidal_crs(&c.system))
            .ok_or_else(|| {
                CoverageError::UnsupportedReferencing(
                    "no geodetic CRS found in domain".to_string(),
                )
            })?;
        let lon_index = longitude_axis_index(&connection.system).ok_or_else(|| {
            CoverageError::UnsupportedReferencing(
                "geodetic CRS does not define a longitude axis position".to_string(),
            )
        })?;
        let lon_coordinate = connection.coordinates.get(lon_index).ok_or_else(|| {
            CoverageError::UnsupportedReferencing(format!(
                "geodetic CRS has no coordinate at longitude position {lon_index}"
            ))
        })?;

        let (lon_min, lon_max) = longitude_extent(domain, lon_coordinate)?;
        Ok(Self {
            wrapper: LongitudeWrapper::from_extent(lon_min, lon_max),
            lon_index,
        })
    }
}

impl Projection for LonLatProjection {
    fn project(&self, pos: LonLat) -> Xy {
        let lon = self.wrapper.wrap(pos.lon);
        if self.lon_index == 0 {
            Xy { x: lon, y: pos.lat }
        } else {
            Xy { x: pos.lat, y: lon }
        }
    }

    fn unproject(&self, pos: Xy) -> LonLat {
        if self.lon_index == 0 {
            LonLat {
                lon: pos.x,
                lat: pos.y,
            }
        } else {
            LonLat {
                lon: pos.y,
                lat: pos.x,
            }
        }
    }
}

/// Min/max longitude occurring in the domain for the given coordinate.
///
/// An O(n) scan over the axis values; for big composite axes callers may
/// want to keep the resulting projection around.
fn longitude_extent(domain: &Domain, lon_coordinate: &str) -> CoverageResult<(f64, f64)> {
    if let Some(axis) = domain.axis(lon_coordinate) {
        // longitude is a grid axis
        let values = axis.values.as_numbers().ok_or_else(|| {
            CoverageError::UnsupportedReferencing(format!(
                "longitude axis '{lon_coordinate}' has non-numeric values"
            ))
        })?;
        let mut lon_min = values[0];
        let mut lon_max = values[values.len() - 1];
        if lon_min > lon_max {
            std::mem::swap(&mut lon_min, &mut lon_max);
        }
        return Ok((lon_min, lon_max));
    }

    // longitude is a component of a composite axis
    let axis = domain.axis_with_coordinate(lon_coordinate).ok_or_else(|| {
        CoverageError::UnsupportedReferencing(format!(
            "coordinate '{lon_coordinate}' not found on any axis"
        ))
    })?;
    let component = axis
        .coordinates
        .iter()
        .position(|c| c == lon_coordinate)
        .unwrap_or(0);

    let mut lon_min = f64::INFINITY;
    let mut lon_max = f64::NEG_INFINITY;
    match &axis.values {
        AxisValues::Tuples(tuples) => {
            for tuple in tuples.iter() {
                if let Some(&lon) = tuple.get(component) {
                    lon_min = lon.min(lon_min);
                    lon_max = lon.max(lon_max);
                }
            }
        }
        AxisValues::Polygons(polygons) => {
            for polygon in polygons.iter() {
                for ring in polygon {
                    for point in ring {
                        let lon = point[component.min(1)];
                        lon_min = lon.min(lon_min);
                        lon_max = lon.max(lon_max);
                    }
                }
            }
        }
        _ => {
            return Err(CoverageError::UnsupportedReferencing(format!(
                "axis '{}' carries neither tuples nor polygons",
                axis.key
            )))
        }
    }
    Ok((lon_min, lon_max))
}

static PROJECTION_CACHE: Lazy<RwLock<HashMap<String, ProjectionRef>>> =
    Lazy::new(Default::default);

/// Cache a projection for a CRS identifier, process-wide.
pub fn register_projection(crs_id: impl Into<String>, projection: ProjectionRef) {
    let crs_id = crs_id.into();
    debug!(crs = %crs_id, "caching projection");
    let mut cache = match PROJECTION_CACHE.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    cache.insert(crs_id, projection);
}

/// A previously cached projection for a CRS identifier.
pub fn cached_projection(crs_id: &str) -> Option<ProjectionRef> {
    let cache = match PROJECTION_CACHE.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    cache.get(crs_id).cloned()
}

/// The projection for the CRS found in the coverage domain.
///
/// Geodetic lat/lon CRSs get the built-in longitude-wrapping projection.
/// For any other CRS this returns an already-cached projection; callers
/// needing remotely defined projections must go through
/// [`load_projection`] first, otherwise this fails with
/// `ProjectionNotCached`.
pub fn get_projection(domain: &Domain) -> CoverageResult<ProjectionRef> {
    let is_ellipsoidal = domain
        .referencing
        .iter()
        .any(|c| is_ellipsoidal_crs(&c.system));
    if is_ellipsoidal {
        return Ok(Arc::new(LonLatProjection::from_domain(domain)?));
    }

    let connection = find_horizontal_crs(domain)?;
    let crs_id = connection.system.id().ok_or_else(|| {
        CoverageError::UnsupportedReferencing(
            "horizontal CRS has no identifier to look up".to_string(),
        )
    })?;
    cached_projection(crs_id)
        .ok_or_else(|| CoverageError::ProjectionNotCached(crs_id.to_string()))
}

/// Resolves projection definitions for CRS identifiers, e.g. from a remote
/// registry. Consumed by [`load_projection`]; the engine performs no I/O
/// itself.
#[async_trait]
pub trait ProjectionLoader: Send + Sync {
    /// Load the projection definition for a CRS identifier.
    async fn load(&self, crs_id: &str) -> CoverageResult<ProjectionRef>;
}

/// Like [`get_projection`], but resolves uncached CRSs through the given
/// loader, caching the result for later `get_projection` calls.
pub async fn load_projection(
    domain: &Domain,
    loader: &dyn ProjectionLoader,
) -> CoverageResult<ProjectionRef> {
    match get_projection(domain) {
        Err(CoverageError::ProjectionNotCached(crs_id)) => {
            debug!(crs = %crs_id, "loading projection");
            let projection = loader.load(&crs_id).await?;
            register_projection(crs_id, Arc::clone(&projection));
            Ok(projection)
        }
        other => other,
    }
}
