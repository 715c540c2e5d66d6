//! Value-based subsetting: resolves value-domain constraints into index
//! constraints, then delegates to index subsetting.

use std::borrow::Cow;

use tracing::debug;

use coverage_common::{
    index_of_nearest, indices_of_nearest, CoverageError, CoverageResult, Domain, IndexConstraint,
    IndexConstraints, TargetValue, ValueConstraint, ValueConstraints,
};
use coverage_projection::{
    as_time, is_iso_date_axis, is_longitude_axis, longitude_wrapper, parse_iso_time,
    LongitudeWrapper,
};

use crate::coverage::CoverageRef;

/// Subset a coverage by per-axis value constraints.
///
/// ISO-date axes are compared as epoch milliseconds and longitude axes
/// have constraint values wrapped into the axis's longitude window before
/// searching. Constraints on unknown axes are ignored.
pub async fn subset_coverage_by_value(
    cov: CoverageRef,
    constraints: &ValueConstraints,
) -> CoverageResult<CoverageRef> {
    let domain = cov.load_domain().await?;

    let mut index_constraints = IndexConstraints::new();
    for (axis_name, constraint) in constraints {
        if domain.axis(axis_name).is_none() {
            continue;
        }
        let resolved = resolve_constraint(&domain, axis_name, constraint)?;
        index_constraints.insert(axis_name.clone(), resolved);
    }
    debug!(axes = index_constraints.len(), "resolved value constraints");

    cov.subset_by_index(&index_constraints).await
}

/// Subset a grid coverage to a bounding box in native CRS coordinates.
///
/// Any grid cell intersecting `[xmin, ymin, xmax, ymax]` is included.
pub async fn subset_by_bbox(
    cov: CoverageRef,
    bbox: [f64; 4],
    axes: [&str; 2],
) -> CoverageResult<CoverageRef> {
    let [xmin, ymin, xmax, ymax] = bbox;
    let mut constraints = ValueConstraints::new();
    constraints.insert(axes[0].to_string(), ValueConstraint::interval(xmin, xmax));
    constraints.insert(axes[1].to_string(), ValueConstraint::interval(ymin, ymax));
    cov.subset_by_value(&constraints).await
}

/// Resolve one axis's value constraint to an index constraint.
pub(crate) fn resolve_constraint(
    domain: &Domain,
    axis_name: &str,
    constraint: &ValueConstraint,
) -> CoverageResult<IndexConstraint> {
    let axis = domain.axis(axis_name).ok_or_else(|| {
        CoverageError::InvalidArgument(format!("domain has no axis '{axis_name}'"))
    })?;

    let is_iso = is_iso_date_axis(domain, axis_name);
    let wrapper = if is_longitude_axis(domain, axis_name) {
        Some(longitude_wrapper(domain, axis_name)?)
    } else {
        None
    };

    // the numeric view the searches run over: epoch milliseconds for
    // ISO-date axes, the axis values themselves for numeric axes
    let numeric: Option<Cow<'_, [f64]>> = if is_iso {
        let strings = axis.values.as_strings().unwrap_or_default();
        let mut millis = Vec::with_capacity(strings.len());
        for s in strings {
            let ms = parse_iso_time(s).ok_or_else(|| CoverageError::InvalidDate(s.clone()))?;
            millis.push(ms as f64);
        }
        Some(Cow::Owned(millis))
    } else {
        axis.values.as_numbers().map(Cow::Borrowed)
    };

    match constraint {
        ValueConstraint::Exact(value) => {
            let index = if let Some(values) = &numeric {
                let target = numeric_target(axis_name, value, is_iso, wrapper)?;
                values.iter().position(|v| *v == target)
            } else if let Some(values) = axis.values.as_strings() {
                match value {
                    TargetValue::String(s) => values.iter().position(|v| v == s),
                    other => {
                        return Err(CoverageError::InvalidConstraintType {
                            axis: axis_name.to_string(),
                            message: format!("expected a string value, got {other}"),
                        })
                    }
                }
            } else {
                return Err(CoverageError::InvalidConstraintType {
                    axis: axis_name.to_string(),
                    message: "exact matching is not supported on composite axes".to_string(),
                });
            };

            let index = index.ok_or_else(|| CoverageError::ValueNotFound {
                axis: axis_name.to_string(),
                value: value.to_string(),
            })?;
            Ok(IndexConstraint::Index(index))
        }

        ValueConstraint::Nearest { target } => {
            let values = numeric_axis_values(axis_name, &numeric)?;
            let target = numeric_target(axis_name, target, is_iso, wrapper)?;
            let index = index_of_nearest(values, target)?;
            Ok(IndexConstraint::Index(index))
        }

        ValueConstraint::Interval { start, stop } => {
            let values = numeric_axis_values(axis_name, &numeric)?;
            let start = numeric_target(axis_name, start, is_iso, wrapper)?;
            let stop = numeric_target(axis_name, stop, is_iso, wrapper)?;

            let (lo1, hi1) = indices_of_nearest(values, start)?;
            let (lo2, hi2) = indices_of_nearest(values, stop)?;

            // may include one index too much on either edge; since axis
            // bounds are not consulted this slack is deliberate
            let imin = lo1.min(hi1).min(lo2).min(hi2);
            let imax = lo1.max(hi1).max(lo2).max(hi2) + 1;
            Ok(IndexConstraint::range(imin, imax))
        }
    }
}

fn numeric_axis_values<'a>(
    axis_name: &str,
    numeric: &'a Option<Cow<'_, [f64]>>,
) -> CoverageResult<&'a [f64]> {
    numeric.as_deref().ok_or_else(|| CoverageError::InvalidConstraintType {
        axis: axis_name.to_string(),
        message: "axis values are not numeric".to_string(),
    })
}

fn numeric_target(
    axis_name: &str,
    value: &TargetValue,
    is_iso: bool,
    wrapper: Option<LongitudeWrapper>,
) -> CoverageResult<f64> {
    if is_iso {
        return Ok(as_time(value)? as f64);
    }
    match value {
        TargetValue::Number(n) => Ok(wrapper.map_or(*n, |w| w.wrap(*n))),
        other => Err(CoverageError::InvalidConstraintType {
            axis: axis_name.to_string(),
            message: format!("expected a numeric value, got {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coverage_common::{Axis, ReferenceSystem, ReferenceSystemConnection};
    use coverage_projection::CRS84;

    fn test_domain() -> Domain {
        Domain::new(
            Some("Grid".to_string()),
            vec![
                Axis::primitive("x", vec![0.0, 120.0, 240.0, 360.0]),
                Axis::primitive("y", vec![2.0, 5.0, 8.0, 12.0, 13.0]),
                Axis::primitive(
                    "t",
                    vec![
                        "2001-01-01T00:00:00Z",
                        "2001-01-02T00:00:00Z",
                        "2001-01-03T00:00:00Z",
                    ],
                ),
            ],
            vec![ReferenceSystemConnection::new(
                vec!["x".to_string()],
                ReferenceSystem::Geodetic {
                    id: Some(CRS84.to_string()),
                },
            )],
        )
        .unwrap()
    }

    #[test]
    fn test_exact_numeric() {
        let constraint = ValueConstraint::exact(8.0);
        let resolved = resolve_constraint(&test_domain(), "y", &constraint).unwrap();
        assert_eq!(resolved, IndexConstraint::Index(2));
    }

    #[test]
    fn test_exact_miss() {
        let constraint = ValueConstraint::exact(9.0);
        assert!(matches!(
            resolve_constraint(&test_domain(), "y", &constraint),
            Err(CoverageError::ValueNotFound { .. })
        ));
    }

    #[test]
    fn test_exact_longitude_wraps() {
        // -120 wraps into the [0, 360] window as 240
        let constraint = ValueConstraint::exact(-120.0);
        let resolved = resolve_constraint(&test_domain(), "x", &constraint).unwrap();
        assert_eq!(resolved, IndexConstraint::Index(2));
    }

    #[test]
    fn test_exact_iso_date() {
        let constraint = ValueConstraint::exact("2001-01-02T00:00:00.000Z");
        let resolved = resolve_constraint(&test_domain(), "t", &constraint).unwrap();
        assert_eq!(resolved, IndexConstraint::Index(1));
    }

    #[test]
    fn test_nearest() {
        let resolved =
            resolve_constraint(&test_domain(), "y", &ValueConstraint::nearest(6.0)).unwrap();
        assert_eq!(resolved, IndexConstraint::Index(1));

        let resolved =
            resolve_constraint(&test_domain(), "y", &ValueConstraint::nearest(7.0)).unwrap();
        assert_eq!(resolved, IndexConstraint::Index(2));
    }

    #[test]
    fn test_nearest_iso_date() {
        let resolved = resolve_constraint(
            &test_domain(),
            "t",
            &ValueConstraint::nearest("2001-01-02T10:00:00Z"),
        )
        .unwrap();
        assert_eq!(resolved, IndexConstraint::Index(1));
    }

    #[test]
    fn test_nearest_wrong_type() {
        assert!(matches!(
            resolve_constraint(&test_domain(), "y", &ValueConstraint::nearest("high")),
            Err(CoverageError::InvalidConstraintType { .. })
        ));
    }

    #[test]
    fn test_interval_over_inclusion() {
        // [6, 10] brackets to indices {1, 2} and {2, 3}: one extra index on
        // either edge is included deliberately
        let resolved =
            resolve_constraint(&test_domain(), "y", &ValueConstraint::interval(6.0, 10.0))
                .unwrap();
        assert_eq!(resolved, IndexConstraint::range(1, 4));
    }

    #[test]
    fn test_interval_beyond_ends() {
        let resolved =
            resolve_constraint(&test_domain(), "y", &ValueConstraint::interval(-10.0, 100.0))
                .unwrap();
        assert_eq!(resolved, IndexConstraint::range(0, 5));
    }
}
