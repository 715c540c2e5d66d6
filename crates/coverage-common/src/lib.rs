//! Common types and utilities shared across the coverage-tools crates.
//!
//! Holds the immutable domain model (axes, shared value storage, reference
//! system bindings), parameter metadata, subset constraint types, the
//! nearest-value search primitive and the workspace error type.

pub mod axis;
pub mod constraint;
pub mod domain;
pub mod error;
pub mod parameters;
pub mod search;
pub mod values;

pub use axis::{Axis, AxisBounds};
pub use constraint::{
    IndexConstraint, IndexConstraints, IndexRange, TargetValue, ValueConstraint, ValueConstraints,
};
pub use domain::{Domain, ReferenceSystem, ReferenceSystemConnection};
pub use error::{CoverageError, CoverageResult};
pub use parameters::{Category, I18nString, ObservedProperty, Parameter, ParameterMap, Unit};
pub use search::{index_of_nearest, indices_of_nearest};
pub use values::{AxisValues, PolygonCoords, Ring, SharedValues};
