//! Coordinate reference system handling for coverage domains.
//!
//! Identifies the horizontal CRS of a domain, classifies longitude and
//! ISO-date axes, wraps longitudes into a domain's longitude window and
//! derives project/unproject function pairs, including the built-in
//! geodetic longitude-wrapping projection.

pub mod crs;
pub mod projection;
pub mod referencing;

pub use crs::{is_ellipsoidal_crs, longitude_axis_index, CRS84, EPSG4326, EPSG4979};
pub use projection::{
    cached_projection, get_projection, load_projection, register_projection, reproject_coords,
    LonLat, LonLatProjection, Projection, ProjectionLoader, ProjectionRef, Xy,
};
pub use referencing::{
    as_time, find_horizontal_crs, find_reference, horizontal_reference, is_iso_date_axis,
    is_longitude_axis, longitude_wrapper, parse_iso_time, LongitudeWrapper,
};
