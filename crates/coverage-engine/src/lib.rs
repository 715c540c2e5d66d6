//! Lazy coverage transformation and subsetting engine.
//!
//! A coverage pairs a lazily loaded domain (named coordinate axes plus
//! CRS referencing) with lazily loaded per-parameter value ranges. This
//! crate provides the [`Coverage`]/[`Range`] contracts, in-memory coverage
//! construction, index- and value-based subsetting, composable lazy
//! transformations (parameter swaps, category remapping, range mapping,
//! derived parameters, reprojection) and polygon masking. Every operation
//! returns a new coverage wrapping the previous one; sources are never
//! mutated, and subsetting a transformed coverage reproduces the
//! transformation on top of the subset.

pub mod coverage;
pub mod create;
pub mod mask;
pub mod subset;
pub mod transform;

pub use coverage::{Coverage, CoverageRef, DataType, GridIndex, Range, RangeRef};
pub use create::{from_domain, from_domain_with_grid_axes, ArrayCoverage, NdArrayRange};
pub use mask::{mask_by_polygon, PolygonClassifier, PolygonGeometry};
pub use subset::{
    normalize_index_constraints, subset_by_bbox, subset_coverage_by_index,
    subset_coverage_by_value, subset_domain_by_index,
};
pub use transform::{
    map_range, reproject, with_categories, with_derived_parameter, with_parameters,
    with_simple_derived_parameter, DeriveFn, DerivedParameterSpec, RangeMapFn, SimpleDeriveFn,
};

// the shared model types most callers need alongside the engine
pub use coverage_common::{
    Axis, AxisBounds, AxisValues, Category, CoverageError, CoverageResult, Domain, I18nString,
    IndexConstraint, IndexConstraints, ObservedProperty, Parameter, ParameterMap,
    ReferenceSystem, ReferenceSystemConnection, TargetValue, Unit, ValueConstraint,
    ValueConstraints,
};
