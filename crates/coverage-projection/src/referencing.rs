//! Reference system lookup and axis classification for coverage domains.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use coverage_common::{
    CoverageError, CoverageResult, Domain, ReferenceSystemConnection, TargetValue,
};

use crate::crs::{longitude_axis_index_for_id, GEOGRAPHIC_CRS_IDS};

/// The reference system connection governing the given coordinate
/// identifier, or `None` if no entry binds it.
pub fn find_reference<'a>(
    domain: &'a Domain,
    coordinate_id: &str,
) -> Option<&'a ReferenceSystemConnection> {
    domain
        .referencing
        .iter()
        .find(|connection| connection.coordinates.iter().any(|c| c == coordinate_id))
}

/// The first referencing entry with a horizontal system kind, or `None`.
///
/// A horizontal CRS is geodetic (typically ellipsoidal, meaning lat/lon),
/// geocentric or projected, and may carry more than two components.
pub fn horizontal_reference(domain: &Domain) -> Option<&ReferenceSystemConnection> {
    domain
        .referencing
        .iter()
        .find(|connection| connection.system.is_horizontal())
}

/// The unique horizontal CRS of the domain, for callers that require one.
///
/// Fails with `UnsupportedReferencing` when the domain has no horizontal
/// CRS, more than one, or one wider than two components (reprojection
/// supports only 2-D horizontal CRSs).
pub fn find_horizontal_crs(domain: &Domain) -> CoverageResult<&ReferenceSystemConnection> {
    let mut horizontal = domain
        .referencing
        .iter()
        .filter(|connection| connection.system.is_horizontal());

    let connection = horizontal.next().ok_or_else(|| {
        CoverageError::UnsupportedReferencing("no horizontal CRS found in domain".to_string())
    })?;
    if horizontal.next().is_some() {
        return Err(CoverageError::UnsupportedReferencing(
            "domain has more than one horizontal CRS".to_string(),
        ));
    }
    if connection.coordinates.len() > 2 {
        return Err(CoverageError::UnsupportedReferencing(format!(
            "horizontal CRS has {} components, at most 2 are supported",
            connection.coordinates.len()
        )));
    }
    Ok(connection)
}

/// Whether the given domain axis represents longitudes.
///
/// True when the axis is bound to one of the known geodetic CRSs at the
/// longitude component position of that CRS.
pub fn is_longitude_axis(domain: &Domain, axis_name: &str) -> bool {
    let Some(connection) = find_reference(domain, axis_name) else {
        return false;
    };
    let Some(crs_id) = connection.system.id() else {
        return false;
    };
    if !GEOGRAPHIC_CRS_IDS.contains(&crs_id) {
        return false;
    }
    let component_index = connection.coordinates.iter().position(|c| c == axis_name);
    longitude_axis_index_for_id(crs_id) == component_index
}

/// Whether the axis carries ISO 8601 date strings as values.
pub fn is_iso_date_axis(domain: &Domain, axis_name: &str) -> bool {
    let Some(axis) = domain.axis(axis_name) else {
        return false;
    };
    match axis.values.as_strings() {
        Some(values) => values
            .first()
            .map(|v| parse_iso_time(v).is_some())
            .unwrap_or(false),
        None => false,
    }
}

/// Coerce a constraint value to epoch milliseconds.
///
/// Accepts timestamps and ISO 8601 strings; anything else fails with
/// `InvalidDate`.
pub fn as_time(value: &TargetValue) -> CoverageResult<i64> {
    match value {
        TargetValue::Time(time) => Ok(time.timestamp_millis()),
        TargetValue::String(s) => {
            parse_iso_time(s).ok_or_else(|| CoverageError::InvalidDate(s.clone()))
        }
        TargetValue::Number(n) => Err(CoverageError::InvalidDate(n.to_string())),
    }
}

/// Parse an ISO 8601 instant to epoch milliseconds.
///
/// Accepts RFC 3339 timestamps, timezone-less date-times (taken as UTC)
/// and bare dates.
pub fn parse_iso_time(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).timestamp_millis());
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&ndt).timestamp_millis());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let ndt = date.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&ndt).timestamp_millis());
    }
    None
}

/// Converts arbitrary longitudes into the longitude extent of a domain
/// axis.
///
/// The extent is extended to 360 degrees, equally on both sides. For a
/// domain with longitudes within [0, 360], an input of -70 converts to
/// 290 and all longitudes within [0, 360] are returned unchanged. For a
/// domain within [10, 50] the extended range is [-150, 210] and an input
/// of -170 converts to 190.
#[derive(Debug, Clone, Copy)]
pub struct LongitudeWrapper {
    x_min: f64,
    x_max: f64,
}

impl LongitudeWrapper {
    /// Build a wrapper for the window `[mid - 180, mid + 180]` around the
    /// midpoint of the given longitude extent.
    pub fn from_extent(lon_min: f64, lon_max: f64) -> Self {
        let x_mid = (lon_max + lon_min) / 2.0;
        Self {
            x_min: x_mid - 180.0,
            x_max: x_mid + 180.0,
        }
    }

    /// The extended window.
    pub fn window(&self) -> (f64, f64) {
        (self.x_min, self.x_max)
    }

    /// Wrap a longitude into the window.
    ///
    /// In-window values are returned unchanged to avoid introducing
    /// rounding errors.
    pub fn wrap(&self, lon: f64) -> f64 {
        if self.x_min <= lon && lon <= self.x_max {
            lon
        } else {
            ((lon - self.x_min) % 360.0 + 360.0) % 360.0 + self.x_min
        }
    }
}

/// The longitude wrapper for a primitive longitude axis of the domain.
///
/// Only primitive axes are supported since this is what value subsetting
/// operates on. Fails with `NotALongitudeAxis` when the axis is not bound
/// to a geodetic CRS at the longitude position, or is not numeric.
pub fn longitude_wrapper(domain: &Domain, axis_name: &str) -> CoverageResult<LongitudeWrapper> {
    if !is_longitude_axis(domain, axis_name) {
        return Err(CoverageError::NotALongitudeAxis(axis_name.to_string()));
    }
    let values = domain
        .axis(axis_name)
        .and_then(|axis| axis.values.as_numbers())
        .ok_or_else(|| CoverageError::NotALongitudeAxis(axis_name.to_string()))?;

    let mut lon_min = values[0];
    let mut lon_max = values[values.len() - 1];
    if lon_min > lon_max {
        std::mem::swap(&mut lon_min, &mut lon_max);
    }
    Ok(LongitudeWrapper::from_extent(lon_min, lon_max))
}
