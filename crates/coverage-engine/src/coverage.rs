//! The coverage and range access contracts.
//!
//! A coverage pairs a lazily loaded domain with lazily loaded per-parameter
//! ranges. Every transformation in this crate returns a new object
//! satisfying [`Coverage`], wrapping the previous one; sources are never
//! mutated.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;

use coverage_common::{
    CoverageResult, Domain, IndexConstraints, ParameterMap, ValueConstraints,
};

/// A full or partial mapping from axis key to axis index.
///
/// Axes missing from the mapping default to index 0.
pub type GridIndex = HashMap<String, usize>;

/// Shared handle to a coverage.
pub type CoverageRef = Arc<dyn Coverage>;

/// Shared handle to a range.
pub type RangeRef = Arc<dyn Range>;

/// Data type of range values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Float,
    Integer,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Float => write!(f, "float"),
            DataType::Integer => write!(f, "integer"),
        }
    }
}

/// The value lookup table of one parameter over a domain's index space.
///
/// `get` must be a pure function of its input indices for a given range
/// instance; the engine may call it densely in nested loops.
pub trait Range: Send + Sync {
    /// Data type of the values.
    fn data_type(&self) -> DataType;

    /// Per-axis lengths of this range.
    fn shape(&self) -> &HashMap<String, usize>;

    /// The value at the given cell, or `None` for no data.
    fn get(&self, index: &GridIndex) -> Option<f64>;
}

/// A parameterized dataset over a domain, exposing lazily loaded value
/// ranges per parameter.
///
/// Loaders may be called multiple times; callers may cache the results.
/// Subsetting a derived coverage reproduces the derivation layered on top
/// of a subset of the source, so transformations survive subsetting
/// recursively.
#[async_trait]
pub trait Coverage: Send + Sync {
    /// Domain type identifier, e.g. "Grid".
    fn domain_type(&self) -> Option<&str>;

    /// The parameter catalogue.
    fn parameters(&self) -> &ParameterMap;

    /// Load the domain.
    async fn load_domain(&self) -> CoverageResult<Arc<Domain>>;

    /// Load the range of one parameter.
    async fn load_range(&self, key: &str) -> CoverageResult<RangeRef>;

    /// Load the ranges of the given parameters, or of all parameters,
    /// preserving key order. Ranges are loaded concurrently.
    async fn load_ranges(
        &self,
        keys: Option<&[String]>,
    ) -> CoverageResult<Vec<(String, RangeRef)>> {
        let keys: Vec<String> = match keys {
            Some(keys) => keys.to_vec(),
            None => self.parameters().keys().cloned().collect(),
        };
        let ranges = try_join_all(keys.iter().map(|key| self.load_range(key))).await?;
        Ok(keys.into_iter().zip(ranges).collect())
    }

    /// A new coverage restricted to the given per-axis index constraints.
    async fn subset_by_index(&self, constraints: &IndexConstraints) -> CoverageResult<CoverageRef>;

    /// A new coverage restricted to the given per-axis value constraints.
    async fn subset_by_value(&self, constraints: &ValueConstraints) -> CoverageResult<CoverageRef>;
}
