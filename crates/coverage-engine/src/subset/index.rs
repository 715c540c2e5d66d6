//! Index-based subsetting of domains and coverages.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use coverage_common::{
    Axis, CoverageError, CoverageResult, Domain, IndexConstraint, IndexConstraints, IndexRange,
    ParameterMap, ValueConstraints,
};

use crate::coverage::{Coverage, CoverageRef, DataType, GridIndex, Range, RangeRef};
use crate::subset::subset_coverage_by_value;

/// Normalize per-axis index constraints against a domain.
///
/// After normalization every domain axis has a constraint and each
/// constraint satisfies `start < stop <= len` and `step >= 1`. A bare
/// index `n` selects exactly `{n, n+1, 1}`; missing constraints default to
/// the full axis range; constraints on unknown axis keys are ignored.
pub fn normalize_index_constraints(
    domain: &Domain,
    constraints: &IndexConstraints,
) -> CoverageResult<HashMap<String, IndexRange>> {
    let mut normalized = HashMap::new();

    for (axis_name, constraint) in constraints {
        let Some(axis) = domain.axis(axis_name) else {
            continue;
        };
        let len = axis.len();
        let range = match *constraint {
            IndexConstraint::Index(index) => IndexRange {
                start: index,
                stop: index + 1,
                step: 1,
            },
            IndexConstraint::Slice { start, stop, step } => IndexRange {
                start: start.unwrap_or(0),
                stop: stop.unwrap_or(len),
                step: step.unwrap_or(1),
            },
        };

        if range.step == 0 {
            return Err(CoverageError::InvalidConstraint {
                axis: axis_name.clone(),
                message: "step must be > 0".to_string(),
            });
        }
        if range.start >= range.stop {
            return Err(CoverageError::InvalidConstraint {
                axis: axis_name.clone(),
                message: format!("stop={} must be > start={}", range.stop, range.start),
            });
        }
        if range.stop > len {
            return Err(CoverageError::InvalidConstraint {
                axis: axis_name.clone(),
                message: format!("stop={} exceeds axis length {len}", range.stop),
            });
        }
        normalized.insert(axis_name.clone(), range);
    }

    for axis in domain.axes() {
        normalized
            .entry(axis.key.clone())
            .or_insert_with(|| IndexRange::full(axis.len()));
    }
    Ok(normalized)
}

/// Subset a domain's axis arrays by normalized index constraints.
///
/// Identity constraints share the axis value storage by reference;
/// `step == 1` takes a contiguous view over the same backing; strided
/// constraints copy. Bounds are re-indexed lazily, never materialized.
pub fn subset_domain_by_index(
    domain: &Domain,
    constraints: &HashMap<String, IndexRange>,
) -> CoverageResult<Domain> {
    let mut axes = Vec::with_capacity(domain.axes().len());
    for axis in domain.axes() {
        let range = constraints
            .get(&axis.key)
            .copied()
            .unwrap_or_else(|| IndexRange::full(axis.len()));

        let (values, bounds) = if range.is_identity(axis.len()) {
            (axis.values.clone(), axis.bounds.clone())
        } else if range.step == 1 {
            (
                axis.values.slice(range.start, range.stop),
                axis.bounds.as_ref().map(|b| b.strided(range.start, 1)),
            )
        } else {
            (
                axis.values.stride(range.start, range.stop, range.step),
                axis.bounds
                    .as_ref()
                    .map(|b| b.strided(range.start, range.step)),
            )
        };

        axes.push(Axis {
            key: axis.key.clone(),
            coordinates: axis.coordinates.clone(),
            values,
            bounds,
        });
    }
    Domain::new(domain.domain_type.clone(), axes, domain.referencing.clone())
}

/// A range view translating subset indices back to source indices.
struct SubsetRange {
    source: RangeRef,
    constraints: Arc<HashMap<String, IndexRange>>,
    shape: HashMap<String, usize>,
}

impl Range for SubsetRange {
    fn data_type(&self) -> DataType {
        self.source.data_type()
    }

    fn shape(&self) -> &HashMap<String, usize> {
        &self.shape
    }

    fn get(&self, index: &GridIndex) -> Option<f64> {
        let mut source_index = GridIndex::with_capacity(self.constraints.len());
        for (axis_name, range) in self.constraints.iter() {
            let i = index.get(axis_name).copied().unwrap_or(0);
            source_index.insert(axis_name.clone(), range.source_index(i));
        }
        self.source.get(&source_index)
    }
}

/// A coverage whose domain and ranges are index-subsets of a source
/// coverage. Range values are translated lazily on access.
#[derive(Clone)]
pub struct IndexSubsetCoverage {
    source: CoverageRef,
    domain: Arc<Domain>,
    constraints: Arc<HashMap<String, IndexRange>>,
}

impl IndexSubsetCoverage {
    fn wrap_range(&self, range: RangeRef) -> RangeRef {
        let shape = self
            .domain
            .axes()
            .iter()
            .map(|axis| (axis.key.clone(), axis.len()))
            .collect();
        Arc::new(SubsetRange {
            source: range,
            constraints: Arc::clone(&self.constraints),
            shape,
        })
    }
}

#[async_trait]
impl Coverage for IndexSubsetCoverage {
    fn domain_type(&self) -> Option<&str> {
        self.source.domain_type()
    }

    fn parameters(&self) -> &ParameterMap {
        self.source.parameters()
    }

    async fn load_domain(&self) -> CoverageResult<Arc<Domain>> {
        Ok(Arc::clone(&self.domain))
    }

    async fn load_range(&self, key: &str) -> CoverageResult<RangeRef> {
        let range = self.source.load_range(key).await?;
        Ok(self.wrap_range(range))
    }

    async fn load_ranges(
        &self,
        keys: Option<&[String]>,
    ) -> CoverageResult<Vec<(String, RangeRef)>> {
        let ranges = self.source.load_ranges(keys).await?;
        Ok(ranges
            .into_iter()
            .map(|(key, range)| (key, self.wrap_range(range)))
            .collect())
    }

    async fn subset_by_index(&self, constraints: &IndexConstraints) -> CoverageResult<CoverageRef> {
        subset_coverage_by_index(Arc::new(self.clone()), constraints).await
    }

    async fn subset_by_value(&self, constraints: &ValueConstraints) -> CoverageResult<CoverageRef> {
        subset_coverage_by_value(Arc::new(self.clone()), constraints).await
    }
}

/// Subset a coverage by per-axis index constraints.
///
/// The returned coverage computes its domain eagerly but translates range
/// accesses lazily (`source_index = start + subset_index * step`), and can
/// itself be subset again without bound.
pub async fn subset_coverage_by_index(
    cov: CoverageRef,
    constraints: &IndexConstraints,
) -> CoverageResult<CoverageRef> {
    let domain = cov.load_domain().await?;
    let normalized = normalize_index_constraints(&domain, constraints)?;
    debug!(axes = normalized.len(), "subsetting coverage by index");
    let new_domain = subset_domain_by_index(&domain, &normalized)?;

    Ok(Arc::new(IndexSubsetCoverage {
        source: cov,
        domain: Arc::new(new_domain),
        constraints: Arc::new(normalized),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain() -> Domain {
        Domain::new(
            Some("Grid".to_string()),
            vec![
                Axis::primitive("x", vec![0.0, 10.0, 20.0, 30.0, 40.0]),
                Axis::primitive("y", vec![5.0, 15.0]),
            ],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn test_normalize_defaults_and_bare_index() {
        let mut constraints = IndexConstraints::new();
        constraints.insert("x".to_string(), IndexConstraint::Index(2));

        let normalized = normalize_index_constraints(&domain(), &constraints).unwrap();
        assert_eq!(
            normalized["x"],
            IndexRange { start: 2, stop: 3, step: 1 }
        );
        assert_eq!(normalized["y"], IndexRange::full(2));
    }

    #[test]
    fn test_normalize_ignores_unknown_axes() {
        let mut constraints = IndexConstraints::new();
        constraints.insert("t".to_string(), IndexConstraint::Index(7));

        let normalized = normalize_index_constraints(&domain(), &constraints).unwrap();
        assert!(!normalized.contains_key("t"));
        assert_eq!(normalized.len(), 2);
    }

    #[test]
    fn test_normalize_rejects_invalid() {
        let cases = [
            IndexConstraint::strided(0, 3, 0),
            IndexConstraint::range(3, 3),
            IndexConstraint::range(4, 2),
            IndexConstraint::range(0, 6),
        ];
        for constraint in cases {
            let mut constraints = IndexConstraints::new();
            constraints.insert("x".to_string(), constraint);
            assert!(matches!(
                normalize_index_constraints(&domain(), &constraints),
                Err(CoverageError::InvalidConstraint { .. })
            ));
        }
    }

    #[test]
    fn test_subset_domain_identity_shares_values() {
        let domain = domain();
        let normalized = normalize_index_constraints(&domain, &IndexConstraints::new()).unwrap();
        let subset = subset_domain_by_index(&domain, &normalized).unwrap();

        match (&domain.axis("x").unwrap().values, &subset.axis("x").unwrap().values) {
            (
                coverage_common::AxisValues::Numbers(a),
                coverage_common::AxisValues::Numbers(b),
            ) => assert!(b.shares_storage_with(a)),
            _ => panic!("expected numeric axes"),
        }
    }

    #[test]
    fn test_subset_domain_contiguous_and_strided() {
        let domain = domain();
        let mut constraints = IndexConstraints::new();
        constraints.insert("x".to_string(), IndexConstraint::range(1, 4));
        let normalized = normalize_index_constraints(&domain, &constraints).unwrap();
        let subset = subset_domain_by_index(&domain, &normalized).unwrap();
        assert_eq!(
            subset.axis("x").unwrap().values.as_numbers().unwrap(),
            &[10.0, 20.0, 30.0]
        );

        let mut constraints = IndexConstraints::new();
        constraints.insert("x".to_string(), IndexConstraint::strided(0, 5, 2));
        let normalized = normalize_index_constraints(&domain, &constraints).unwrap();
        let subset = subset_domain_by_index(&domain, &normalized).unwrap();
        assert_eq!(
            subset.axis("x").unwrap().values.as_numbers().unwrap(),
            &[0.0, 20.0, 40.0]
        );
    }
}
