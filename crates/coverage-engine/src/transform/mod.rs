//! Lazy coverage transformations.
//!
//! Every function here wraps a coverage into a new one without touching
//! the source: domain and range loads delegate inward, and the subset
//! operations re-apply the transformation to the subset so it survives
//! subsetting recursively.

mod reproject;

pub use reproject::reproject;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use coverage_common::{
    CoverageError, CoverageResult, Domain, IndexConstraints, ObservedProperty, Parameter,
    ParameterMap, ValueConstraints,
};

use crate::coverage::{Coverage, CoverageRef, DataType, GridIndex, Range, RangeRef};

/// A range-mapping function: receives the axis index object and the
/// original range, returns the replacement value.
pub type RangeMapFn = Arc<dyn Fn(&GridIndex, &dyn Range) -> Option<f64> + Send + Sync>;

/// A derived-parameter function over the input parameter ranges.
pub type DeriveFn = Arc<dyn Fn(&GridIndex, &[RangeRef]) -> Option<f64> + Send + Sync>;

/// A derived-parameter function over already-dereferenced scalar values.
pub type SimpleDeriveFn = Arc<dyn Fn(&[f64]) -> Option<f64> + Send + Sync>;

/// A copy of the given coverage with the parameter catalogue replaced.
///
/// This is a low-level operation; no checks are done on the supplied
/// parameters.
pub fn with_parameters(cov: CoverageRef, parameters: ParameterMap) -> CoverageRef {
    Arc::new(WithParameters {
        inner: cov,
        parameters,
    })
}

#[derive(Clone)]
struct WithParameters {
    inner: CoverageRef,
    parameters: ParameterMap,
}

#[async_trait]
impl Coverage for WithParameters {
    fn domain_type(&self) -> Option<&str> {
        self.inner.domain_type()
    }

    fn parameters(&self) -> &ParameterMap {
        &self.parameters
    }

    async fn load_domain(&self) -> CoverageResult<Arc<Domain>> {
        self.inner.load_domain().await
    }

    async fn load_range(&self, key: &str) -> CoverageResult<RangeRef> {
        self.inner.load_range(key).await
    }

    async fn subset_by_index(&self, constraints: &IndexConstraints) -> CoverageResult<CoverageRef> {
        let subset = self.inner.subset_by_index(constraints).await?;
        Ok(with_parameters(subset, self.parameters.clone()))
    }

    async fn subset_by_value(&self, constraints: &ValueConstraints) -> CoverageResult<CoverageRef> {
        let subset = self.inner.subset_by_value(constraints).await?;
        Ok(with_parameters(subset, self.parameters.clone()))
    }
}

/// A copy of the given coverage with one parameter's categories replaced
/// and its encoding remapped.
///
/// `mapping` lists `(source category id, destination category id)` pairs;
/// the encoded-value lists of all source categories mapping to the same
/// destination are merged. Fails with `InvalidCategory` if any new
/// category has an empty identifier.
pub fn with_categories(
    cov: CoverageRef,
    key: &str,
    observed_property: ObservedProperty,
    mapping: &[(String, String)],
) -> CoverageResult<CoverageRef> {
    let categories = observed_property.categories.as_deref().unwrap_or_default();
    if let Some(category) = categories.iter().find(|c| c.id.is_empty()) {
        return Err(CoverageError::InvalidCategory(format!(
            "category labelled {:?} is missing its identifier",
            category.label.as_ref().map(|l| l.text().to_string())
        )));
    }

    let parameter = cov.parameters().get(key).ok_or_else(|| {
        CoverageError::InvalidArgument(format!("unknown parameter '{key}'"))
    })?;
    let source_encoding = parameter.category_encoding.clone().unwrap_or_default();

    let mut encoding: HashMap<String, Vec<i64>> = HashMap::new();
    for category in categories {
        let mut values = Vec::new();
        for (source_id, destination_id) in mapping {
            if destination_id == &category.id {
                if let Some(encoded) = source_encoding.get(source_id) {
                    values.extend_from_slice(encoded);
                }
            }
        }
        if !values.is_empty() {
            encoding.insert(category.id.clone(), values);
        }
    }

    let new_parameter = Parameter {
        key: parameter.key.clone(),
        observed_property,
        unit: parameter.unit.clone(),
        category_encoding: Some(encoding),
    };
    let mut parameters = cov.parameters().clone();
    parameters.insert(new_parameter);

    Ok(with_parameters(cov, parameters))
}

/// A copy of the given coverage where one parameter's range values are
/// mapped through `map_fn(index, original_range)`.
///
/// Other parameters are untouched. The data type defaults to the original
/// range's.
pub fn map_range(
    cov: CoverageRef,
    key: &str,
    map_fn: RangeMapFn,
    data_type: Option<DataType>,
) -> CoverageRef {
    Arc::new(MappedRangeCoverage {
        inner: cov,
        key: key.to_string(),
        map_fn,
        data_type,
    })
}

struct MappedRange {
    source: RangeRef,
    map_fn: RangeMapFn,
    data_type: Option<DataType>,
}

impl Range for MappedRange {
    fn data_type(&self) -> DataType {
        self.data_type.unwrap_or_else(|| self.source.data_type())
    }

    fn shape(&self) -> &HashMap<String, usize> {
        self.source.shape()
    }

    fn get(&self, index: &GridIndex) -> Option<f64> {
        (self.map_fn)(index, self.source.as_ref())
    }
}

#[derive(Clone)]
struct MappedRangeCoverage {
    inner: CoverageRef,
    key: String,
    map_fn: RangeMapFn,
    data_type: Option<DataType>,
}

impl MappedRangeCoverage {
    fn wrap_range(&self, range: RangeRef) -> RangeRef {
        Arc::new(MappedRange {
            source: range,
            map_fn: Arc::clone(&self.map_fn),
            data_type: self.data_type,
        })
    }
}

#[async_trait]
impl Coverage for MappedRangeCoverage {
    fn domain_type(&self) -> Option<&str> {
        self.inner.domain_type()
    }

    fn parameters(&self) -> &ParameterMap {
        self.inner.parameters()
    }

    async fn load_domain(&self) -> CoverageResult<Arc<Domain>> {
        self.inner.load_domain().await
    }

    async fn load_range(&self, key: &str) -> CoverageResult<RangeRef> {
        let range = self.inner.load_range(key).await?;
        if key == self.key {
            Ok(self.wrap_range(range))
        } else {
            Ok(range)
        }
    }

    async fn load_ranges(
        &self,
        keys: Option<&[String]>,
    ) -> CoverageResult<Vec<(String, RangeRef)>> {
        let ranges = self.inner.load_ranges(keys).await?;
        Ok(ranges
            .into_iter()
            .map(|(key, range)| {
                let range = if key == self.key {
                    self.wrap_range(range)
                } else {
                    range
                };
                (key, range)
            })
            .collect())
    }

    async fn subset_by_index(&self, constraints: &IndexConstraints) -> CoverageResult<CoverageRef> {
        let subset = self.inner.subset_by_index(constraints).await?;
        Ok(map_range(
            subset,
            &self.key,
            Arc::clone(&self.map_fn),
            self.data_type,
        ))
    }

    async fn subset_by_value(&self, constraints: &ValueConstraints) -> CoverageResult<CoverageRef> {
        let subset = self.inner.subset_by_value(constraints).await?;
        Ok(map_range(
            subset,
            &self.key,
            Arc::clone(&self.map_fn),
            self.data_type,
        ))
    }
}

/// Specification of a parameter derived from other parameters' ranges.
#[derive(Clone)]
pub struct DerivedParameterSpec {
    /// The new parameter.
    pub parameter: Parameter,
    /// Keys of the input parameters, all of equal range shape.
    pub input_parameters: Vec<String>,
    /// Data type of the derived range.
    pub data_type: DataType,
    /// Computes the derived value from the input ranges.
    pub derive: DeriveFn,
}

/// A copy of the given coverage with an additional parameter computed on
/// demand from the ranges of existing parameters.
///
/// All input ranges are loaded once per `load_range` call on the derived
/// parameter; their shape is assumed identical and shared.
pub fn with_derived_parameter(
    cov: CoverageRef,
    spec: DerivedParameterSpec,
) -> CoverageResult<CoverageRef> {
    if spec.input_parameters.is_empty() {
        return Err(CoverageError::InvalidArgument(
            "derived parameter needs at least one input parameter".to_string(),
        ));
    }
    for key in &spec.input_parameters {
        if !cov.parameters().contains_key(key) {
            return Err(CoverageError::InvalidArgument(format!(
                "unknown input parameter '{key}'"
            )));
        }
    }

    let mut parameters = cov.parameters().clone();
    parameters.insert(spec.parameter.clone());

    Ok(Arc::new(DerivedParameterCoverage {
        inner: cov,
        parameters,
        spec,
    }))
}

/// Like [`with_derived_parameter`] with a function over already-looked-up
/// scalar values, short-circuiting to `None` when any input value is
/// `None`.
pub fn with_simple_derived_parameter(
    cov: CoverageRef,
    parameter: Parameter,
    input_parameters: Vec<String>,
    data_type: DataType,
    derive: SimpleDeriveFn,
) -> CoverageResult<CoverageRef> {
    let derive: DeriveFn = Arc::new(move |index, ranges| {
        let mut values = Vec::with_capacity(ranges.len());
        for range in ranges {
            values.push(range.get(index)?);
        }
        derive(&values)
    });
    with_derived_parameter(
        cov,
        DerivedParameterSpec {
            parameter,
            input_parameters,
            data_type,
            derive,
        },
    )
}

struct DerivedRange {
    inputs: Vec<RangeRef>,
    shape: HashMap<String, usize>,
    data_type: DataType,
    derive: DeriveFn,
}

impl Range for DerivedRange {
    fn data_type(&self) -> DataType {
        self.data_type
    }

    fn shape(&self) -> &HashMap<String, usize> {
        &self.shape
    }

    fn get(&self, index: &GridIndex) -> Option<f64> {
        (self.derive)(index, &self.inputs)
    }
}

#[derive(Clone)]
struct DerivedParameterCoverage {
    inner: CoverageRef,
    parameters: ParameterMap,
    spec: DerivedParameterSpec,
}

#[async_trait]
impl Coverage for DerivedParameterCoverage {
    fn domain_type(&self) -> Option<&str> {
        self.inner.domain_type()
    }

    fn parameters(&self) -> &ParameterMap {
        &self.parameters
    }

    async fn load_domain(&self) -> CoverageResult<Arc<Domain>> {
        self.inner.load_domain().await
    }

    async fn load_range(&self, key: &str) -> CoverageResult<RangeRef> {
        if key != self.spec.parameter.key {
            return self.inner.load_range(key).await;
        }
        let ranges = self
            .inner
            .load_ranges(Some(&self.spec.input_parameters))
            .await?;
        let inputs: Vec<RangeRef> = ranges.into_iter().map(|(_, range)| range).collect();
        let shape = inputs[0].shape().clone();
        Ok(Arc::new(DerivedRange {
            inputs,
            shape,
            data_type: self.spec.data_type,
            derive: Arc::clone(&self.spec.derive),
        }))
    }

    async fn subset_by_index(&self, constraints: &IndexConstraints) -> CoverageResult<CoverageRef> {
        let subset = self.inner.subset_by_index(constraints).await?;
        with_derived_parameter(subset, self.spec.clone())
    }

    async fn subset_by_value(&self, constraints: &ValueConstraints) -> CoverageResult<CoverageRef> {
        let subset = self.inner.subset_by_value(constraints).await?;
        with_derived_parameter(subset, self.spec.clone())
    }
}
