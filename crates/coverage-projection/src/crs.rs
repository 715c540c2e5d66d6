//! Well-known geodetic CRS identifiers.
//!
//! Process-wide constant configuration: the set of CRSs in which position
//! is specified by geodetic latitude and longitude, and the position of the
//! longitude axis within each.

use coverage_common::ReferenceSystem;

/// Common prefix of OpenGIS CRS identifier URIs.
pub const OPENGIS_CRS_PREFIX: &str = "http://www.opengis.net/def/crs/";

/// 3D WGS84 in lat-lon-height order.
pub const EPSG4979: &str = "http://www.opengis.net/def/crs/EPSG/0/4979";

/// 2D WGS84 in lat-lon order.
pub const EPSG4326: &str = "http://www.opengis.net/def/crs/EPSG/0/4326";

/// 2D WGS84 in lon-lat order.
pub const CRS84: &str = "http://www.opengis.net/def/crs/OGC/1.3/CRS84";

/// CRSs in which position is specified by geodetic latitude and longitude.
pub const GEOGRAPHIC_CRS_IDS: [&str; 3] = [EPSG4979, EPSG4326, CRS84];

/// Position of the longitude axis for a known geodetic CRS identifier.
pub fn longitude_axis_index_for_id(id: &str) -> Option<usize> {
    match id {
        EPSG4979 | EPSG4326 => Some(1),
        CRS84 => Some(0),
        _ => None,
    }
}

/// Whether the reference system specifies horizontal position by geodetic
/// latitude and longitude.
pub fn is_ellipsoidal_crs(system: &ReferenceSystem) -> bool {
    matches!(system, ReferenceSystem::Geographic { .. })
        || system
            .id()
            .map(|id| GEOGRAPHIC_CRS_IDS.contains(&id))
            .unwrap_or(false)
}

/// Position of the longitude axis within an ellipsoidal reference system.
///
/// Known identifiers come from the fixed table; a geographic system without
/// an identifier defaults to lon-first.
pub fn longitude_axis_index(system: &ReferenceSystem) -> Option<usize> {
    if let Some(index) = system.id().and_then(longitude_axis_index_for_id) {
        return Some(index);
    }
    if matches!(system, ReferenceSystem::Geographic { .. }) {
        return Some(0);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longitude_axis_positions() {
        assert_eq!(longitude_axis_index_for_id(EPSG4326), Some(1));
        assert_eq!(longitude_axis_index_for_id(EPSG4979), Some(1));
        assert_eq!(longitude_axis_index_for_id(CRS84), Some(0));
        assert_eq!(longitude_axis_index_for_id("urn:x:unknown"), None);
    }

    #[test]
    fn test_ellipsoidal_classification() {
        let crs84 = ReferenceSystem::Geodetic {
            id: Some(CRS84.to_string()),
        };
        assert!(is_ellipsoidal_crs(&crs84));

        let unlabelled_geographic = ReferenceSystem::Geographic { id: None };
        assert!(is_ellipsoidal_crs(&unlabelled_geographic));
        assert_eq!(longitude_axis_index(&unlabelled_geographic), Some(0));

        let projected = ReferenceSystem::Projected {
            id: Some("http://www.opengis.net/def/crs/EPSG/0/3857".to_string()),
        };
        assert!(!is_ellipsoidal_crs(&projected));
        assert_eq!(longitude_axis_index(&projected), None);
    }
}
