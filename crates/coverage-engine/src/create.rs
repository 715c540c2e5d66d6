//! In-memory coverage construction.
//!
//! [`ArrayCoverage`] backs a coverage with explicit per-parameter ranges,
//! the usual starting point for tests and for data already resident in
//! memory. [`from_domain`] wraps a bare domain into a coverage with a
//! dummy categorical parameter, useful for visualizing domain geometry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use coverage_common::{
    Category, CoverageError, CoverageResult, Domain, IndexConstraints, ObservedProperty,
    Parameter, ParameterMap, ValueConstraints,
};

use crate::coverage::{Coverage, CoverageRef, DataType, GridIndex, Range, RangeRef};
use crate::subset::{subset_coverage_by_index, subset_coverage_by_value};

/// A dense row-major range with nullable cells and named axis order.
#[derive(Debug, Clone)]
pub struct NdArrayRange {
    values: Arc<Vec<Option<f64>>>,
    axis_order: Vec<String>,
    dims: Vec<usize>,
    strides: Vec<usize>,
    shape: HashMap<String, usize>,
    data_type: DataType,
}

impl NdArrayRange {
    /// Create a range from row-major values over named dimensions, given
    /// as `(axis key, length)` pairs outermost first.
    pub fn new(
        data_type: DataType,
        axes: Vec<(String, usize)>,
        values: Vec<Option<f64>>,
    ) -> CoverageResult<Self> {
        let total: usize = axes.iter().map(|(_, len)| len).product();
        if total != values.len() {
            return Err(CoverageError::InvalidArgument(format!(
                "range has {} values but its shape holds {total}",
                values.len()
            )));
        }

        let dims: Vec<usize> = axes.iter().map(|(_, len)| *len).collect();
        let mut strides = vec![1; dims.len()];
        for i in (0..dims.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * dims[i + 1];
        }

        Ok(Self {
            values: Arc::new(values),
            axis_order: axes.iter().map(|(key, _)| key.clone()).collect(),
            shape: axes.into_iter().collect(),
            dims,
            strides,
            data_type,
        })
    }

    fn offset(&self, index: &GridIndex) -> Option<usize> {
        let mut offset = 0;
        for (position, key) in self.axis_order.iter().enumerate() {
            let i = index.get(key).copied().unwrap_or(0);
            if i >= self.dims[position] {
                return None;
            }
            offset += i * self.strides[position];
        }
        Some(offset)
    }
}

impl Range for NdArrayRange {
    fn data_type(&self) -> DataType {
        self.data_type
    }

    fn shape(&self) -> &HashMap<String, usize> {
        &self.shape
    }

    fn get(&self, index: &GridIndex) -> Option<f64> {
        self.values.get(self.offset(index)?).copied().flatten()
    }
}

/// A coverage over in-memory ranges.
#[derive(Clone)]
pub struct ArrayCoverage {
    domain: Arc<Domain>,
    parameters: ParameterMap,
    ranges: HashMap<String, RangeRef>,
}

impl ArrayCoverage {
    /// Create a coverage from a domain, its parameter catalogue and one
    /// range per parameter.
    pub fn new(
        domain: Domain,
        parameters: ParameterMap,
        ranges: HashMap<String, RangeRef>,
    ) -> CoverageResult<Self> {
        for key in parameters.keys() {
            if !ranges.contains_key(key) {
                return Err(CoverageError::InvalidArgument(format!(
                    "no range supplied for parameter '{key}'"
                )));
            }
        }
        Ok(Self {
            domain: Arc::new(domain),
            parameters,
            ranges,
        })
    }

    /// Create a single-parameter coverage from row-major values.
    ///
    /// `axis_order` names the dimensions of `values` outermost first;
    /// lengths are taken from the domain axes.
    pub fn from_grid(
        domain: Domain,
        parameter: Parameter,
        axis_order: &[&str],
        values: Vec<Option<f64>>,
    ) -> CoverageResult<Self> {
        let mut axes = Vec::with_capacity(axis_order.len());
        for key in axis_order {
            let axis = domain.axis(key).ok_or_else(|| {
                CoverageError::InvalidArgument(format!("domain has no axis '{key}'"))
            })?;
            axes.push((axis.key.clone(), axis.len()));
        }
        let range = NdArrayRange::new(DataType::Float, axes, values)?;

        let mut ranges: HashMap<String, RangeRef> = HashMap::new();
        ranges.insert(parameter.key.clone(), Arc::new(range));
        let parameters: ParameterMap = std::iter::once(parameter).collect();
        Self::new(domain, parameters, ranges)
    }
}

#[async_trait]
impl Coverage for ArrayCoverage {
    fn domain_type(&self) -> Option<&str> {
        self.domain.domain_type.as_deref()
    }

    fn parameters(&self) -> &ParameterMap {
        &self.parameters
    }

    async fn load_domain(&self) -> CoverageResult<Arc<Domain>> {
        Ok(Arc::clone(&self.domain))
    }

    async fn load_range(&self, key: &str) -> CoverageResult<RangeRef> {
        self.ranges.get(key).cloned().ok_or_else(|| {
            CoverageError::InvalidArgument(format!("unknown parameter '{key}'"))
        })
    }

    async fn subset_by_index(&self, constraints: &IndexConstraints) -> CoverageResult<CoverageRef> {
        subset_coverage_by_index(Arc::new(self.clone()), constraints).await
    }

    async fn subset_by_value(&self, constraints: &ValueConstraints) -> CoverageResult<CoverageRef> {
        subset_coverage_by_value(Arc::new(self.clone()), constraints).await
    }
}

/// The range of the dummy parameter produced by [`from_domain`]: a
/// checkerboard over the grid axes, or a constant for non-grid domains.
#[derive(Debug, Clone)]
struct CheckerboardRange {
    shape: HashMap<String, usize>,
    grid_axes: Option<(String, String)>,
}

impl Range for CheckerboardRange {
    fn data_type(&self) -> DataType {
        DataType::Integer
    }

    fn shape(&self) -> &HashMap<String, usize> {
        &self.shape
    }

    fn get(&self, index: &GridIndex) -> Option<f64> {
        match &self.grid_axes {
            Some((x, y)) => {
                let i = index.get(x).copied().unwrap_or(0);
                let j = index.get(y).copied().unwrap_or(0);
                Some(((i + j) % 2) as f64)
            }
            None => Some(0.0),
        }
    }
}

/// Wrap a domain into a coverage with a single dummy categorical
/// parameter, using `x`/`y` as the horizontal grid axes.
pub fn from_domain(domain: Domain) -> CoverageResult<CoverageRef> {
    from_domain_with_grid_axes(domain, ["x", "y"])
}

/// Like [`from_domain`] with explicit horizontal grid axis names.
///
/// Domains carrying both grid axes with more than one point get a
/// two-category checkerboard pattern so grid cells stay visible; other
/// domains get a single constant category.
pub fn from_domain_with_grid_axes(
    domain: Domain,
    grid_axes: [&str; 2],
) -> CoverageResult<CoverageRef> {
    let [x, y] = grid_axes;
    let assume_grid = domain.has_axis(x)
        && domain.has_axis(y)
        && (domain.axis(x).map(|a| a.len()).unwrap_or(0) > 1
            || domain.axis(y).map(|a| a.len()).unwrap_or(0) > 1);

    let (categories, encoding) = if assume_grid {
        (
            vec![Category::new("a", "A"), Category::new("b", "B")],
            HashMap::from([("a".to_string(), vec![0]), ("b".to_string(), vec![1])]),
        )
    } else {
        (
            vec![Category::new("a", "X")],
            HashMap::from([("a".to_string(), vec![0])]),
        )
    };

    let parameter = Parameter::new("domain", "Domain")
        .with_observed_property(ObservedProperty::new("Domain").with_categories(categories))
        .with_category_encoding(encoding);

    let shape: HashMap<String, usize> = domain
        .axes()
        .iter()
        .map(|axis| (axis.key.clone(), axis.len()))
        .collect();
    let range = CheckerboardRange {
        shape,
        grid_axes: assume_grid.then(|| (x.to_string(), y.to_string())),
    };

    let mut ranges: HashMap<String, RangeRef> = HashMap::new();
    ranges.insert(parameter.key.clone(), Arc::new(range));
    let coverage = ArrayCoverage::new(domain, std::iter::once(parameter).collect(), ranges)?;
    Ok(Arc::new(coverage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use coverage_common::Axis;

    fn grid_domain() -> Domain {
        Domain::new(
            Some("Grid".to_string()),
            vec![
                Axis::primitive("x", vec![0.0, 1.0, 2.0]),
                Axis::primitive("y", vec![3.0, 4.0]),
            ],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn test_ndarray_range_get() {
        let range = NdArrayRange::new(
            DataType::Float,
            vec![("y".to_string(), 2), ("x".to_string(), 3)],
            vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), None, Some(6.0)],
        )
        .unwrap();

        let mut index = GridIndex::new();
        index.insert("y".to_string(), 1);
        index.insert("x".to_string(), 0);
        assert_eq!(range.get(&index), Some(4.0));

        index.insert("x".to_string(), 1);
        assert_eq!(range.get(&index), None);

        // missing keys default to index 0
        assert_eq!(range.get(&GridIndex::new()), Some(1.0));
    }

    #[test]
    fn test_ndarray_range_shape_mismatch() {
        let result = NdArrayRange::new(
            DataType::Float,
            vec![("x".to_string(), 3)],
            vec![Some(1.0), Some(2.0)],
        );
        assert!(matches!(result, Err(CoverageError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_from_domain_checkerboard() {
        let coverage = from_domain(grid_domain()).unwrap();
        let key = coverage.parameters().keys().next().unwrap().clone();
        let range = coverage.load_range(&key).await.unwrap();

        let cell = |x: usize, y: usize| {
            let mut index = GridIndex::new();
            index.insert("x".to_string(), x);
            index.insert("y".to_string(), y);
            range.get(&index)
        };
        assert_eq!(cell(0, 0), Some(0.0));
        assert_eq!(cell(1, 0), Some(1.0));
        assert_eq!(cell(1, 1), Some(0.0));
    }

    #[tokio::test]
    async fn test_from_domain_parameter_categories() {
        let coverage = from_domain(grid_domain()).unwrap();
        let parameter = coverage.parameters().get("domain").unwrap();
        let categories = parameter
            .observed_property
            .categories
            .as_ref()
            .unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(parameter.category_for_value(1).unwrap().id, "b");
    }

    #[tokio::test]
    async fn test_missing_range_rejected() {
        let parameters: ParameterMap =
            std::iter::once(Parameter::new("t", "Temperature")).collect();
        let result = ArrayCoverage::new(grid_domain(), parameters, HashMap::new());
        assert!(matches!(result, Err(CoverageError::InvalidArgument(_))));
    }
}
