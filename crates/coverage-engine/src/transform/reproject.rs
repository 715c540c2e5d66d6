//! Coverage reprojection.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use coverage_common::{
    Axis, AxisValues, CoverageError, CoverageResult, Domain, IndexConstraints, ParameterMap,
    ReferenceSystemConnection, SharedValues, ValueConstraints,
};
use coverage_projection::{get_projection, horizontal_reference, reproject_coords, Xy};

use crate::coverage::{Coverage, CoverageRef, RangeRef};

/// Reproject a coverage onto the horizontal CRS of a reference domain.
///
/// The horizontal coordinates of the source domain are replaced by
/// unprojecting them to lon/lat and projecting into the target CRS; the
/// matching referencing entry's system is replaced by the target's.
///
/// Limitations, each failing with `UnsupportedReprojection`:
/// - only 2-component horizontal CRSs are supported;
/// - the horizontal components must not coincide with grid (primitive)
///   axes;
/// - the components must live on a point-tuple composite axis (polygon
///   axes are not supported).
///
/// Non-geodetic CRSs must have their projections cached beforehand.
/// Subsetting the result re-reprojects the subset against the same
/// reference domain; value subsetting resolves against the source
/// (un-reprojected) coordinates.
pub async fn reproject(
    cov: CoverageRef,
    reference_domain: Arc<Domain>,
) -> CoverageResult<CoverageRef> {
    let source_domain = cov.load_domain().await?;

    let source_index = source_domain
        .referencing
        .iter()
        .position(|c| c.system.is_horizontal())
        .ok_or_else(|| {
            CoverageError::UnsupportedReprojection(
                "no horizontal CRS found in source domain".to_string(),
            )
        })?;
    let source_ref = &source_domain.referencing[source_index];
    if source_ref.coordinates.len() != 2 {
        return Err(CoverageError::UnsupportedReprojection(format!(
            "horizontal CRS has {} components, exactly 2 are supported",
            source_ref.coordinates.len()
        )));
    }
    if let Some(grid_axis) = source_ref
        .coordinates
        .iter()
        .find(|c| source_domain.has_axis(c))
    {
        return Err(CoverageError::UnsupportedReprojection(format!(
            "horizontal component '{grid_axis}' is a grid axis"
        )));
    }

    let x_coordinate = &source_ref.coordinates[0];
    let y_coordinate = &source_ref.coordinates[1];

    // the composite axis carrying both horizontal components
    let axis = source_domain
        .axes()
        .iter()
        .find(|axis| {
            source_ref
                .coordinates
                .iter()
                .all(|c| axis.coordinates.contains(c))
        })
        .ok_or_else(|| {
            CoverageError::UnsupportedReprojection(
                "no composite axis carries the horizontal components".to_string(),
            )
        })?;
    let x_component = axis
        .coordinates
        .iter()
        .position(|c| c == x_coordinate)
        .unwrap_or(0);
    let y_component = axis
        .coordinates
        .iter()
        .position(|c| c == y_coordinate)
        .unwrap_or(0);

    let tuples = axis.values.as_tuples().ok_or_else(|| {
        CoverageError::UnsupportedReprojection(format!(
            "axis '{}' does not carry point tuples",
            axis.key
        ))
    })?;

    let source_projection = get_projection(&source_domain)?;
    let target_projection = get_projection(&reference_domain)?;

    let target_ref = horizontal_reference(&reference_domain).ok_or_else(|| {
        CoverageError::UnsupportedReprojection(
            "no horizontal CRS found in reference domain".to_string(),
        )
    })?;
    if target_ref.coordinates.len() > 2 {
        return Err(CoverageError::UnsupportedReprojection(format!(
            "target horizontal CRS has {} components, at most 2 are supported",
            target_ref.coordinates.len()
        )));
    }

    debug!(
        axis = %axis.key,
        points = tuples.len(),
        "reprojecting composite axis values"
    );

    // replace the x/y part of every tuple by unprojecting to lon/lat and
    // projecting into the target CRS
    let mut values = Vec::with_capacity(tuples.len());
    for tuple in tuples {
        let mut tuple = tuple.clone();
        let x = tuple.get(x_component).copied().ok_or_else(|| {
            CoverageError::UnsupportedReprojection(format!(
                "tuple on axis '{}' is missing component {x_component}",
                axis.key
            ))
        })?;
        let y = tuple.get(y_component).copied().ok_or_else(|| {
            CoverageError::UnsupportedReprojection(format!(
                "tuple on axis '{}' is missing component {y_component}",
                axis.key
            ))
        })?;
        let projected = reproject_coords(
            Xy { x, y },
            source_projection.as_ref(),
            target_projection.as_ref(),
        );
        tuple[x_component] = projected.x;
        tuple[y_component] = projected.y;
        values.push(tuple);
    }

    let reprojected_key = axis.key.clone();
    let new_axes = source_domain
        .axes()
        .iter()
        .map(|a| {
            if a.key == reprojected_key {
                Axis {
                    key: a.key.clone(),
                    coordinates: a.coordinates.clone(),
                    values: AxisValues::Tuples(SharedValues::new(std::mem::take(&mut values))),
                    // bounds no longer hold in the target CRS
                    bounds: None,
                }
            } else {
                a.clone()
            }
        })
        .collect();

    let new_referencing = source_domain
        .referencing
        .iter()
        .enumerate()
        .map(|(i, connection)| {
            if i == source_index {
                ReferenceSystemConnection::new(
                    connection.coordinates.clone(),
                    target_ref.system.clone(),
                )
            } else {
                connection.clone()
            }
        })
        .collect();

    let new_domain = Domain::new(
        source_domain.domain_type.clone(),
        new_axes,
        new_referencing,
    )?;

    Ok(Arc::new(ReprojectedCoverage {
        inner: cov,
        domain: Arc::new(new_domain),
        reference_domain,
    }))
}

#[derive(Clone)]
struct ReprojectedCoverage {
    inner: CoverageRef,
    domain: Arc<Domain>,
    reference_domain: Arc<Domain>,
}

#[async_trait]
impl Coverage for ReprojectedCoverage {
    fn domain_type(&self) -> Option<&str> {
        self.inner.domain_type()
    }

    fn parameters(&self) -> &ParameterMap {
        self.inner.parameters()
    }

    async fn load_domain(&self) -> CoverageResult<Arc<Domain>> {
        Ok(Arc::clone(&self.domain))
    }

    async fn load_range(&self, key: &str) -> CoverageResult<RangeRef> {
        self.inner.load_range(key).await
    }

    async fn load_ranges(
        &self,
        keys: Option<&[String]>,
    ) -> CoverageResult<Vec<(String, RangeRef)>> {
        self.inner.load_ranges(keys).await
    }

    async fn subset_by_index(&self, constraints: &IndexConstraints) -> CoverageResult<CoverageRef> {
        let subset = self.inner.subset_by_index(constraints).await?;
        reproject(subset, Arc::clone(&self.reference_domain)).await
    }

    async fn subset_by_value(&self, constraints: &ValueConstraints) -> CoverageResult<CoverageRef> {
        let subset = self.inner.subset_by_value(constraints).await?;
        reproject(subset, Arc::clone(&self.reference_domain)).await
    }
}
