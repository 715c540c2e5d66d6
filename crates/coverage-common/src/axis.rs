//! Domain axes and their per-index bounds.

use std::sync::Arc;

use crate::values::AxisValues;

/// Per-index lower/upper extents of axis cells.
///
/// Bounds are accessed by index and never eagerly re-materialized: a
/// subset re-indexes the source bounds through a start/step transform.
#[derive(Debug, Clone)]
pub enum AxisBounds {
    /// Explicit (lower, upper) pairs, one per axis index.
    Explicit(Arc<Vec<(f64, f64)>>),
    /// A lazy view re-indexing `inner` via `i -> start + i * step`.
    Strided {
        inner: Arc<AxisBounds>,
        start: usize,
        step: usize,
    },
}

impl AxisBounds {
    /// Wrap explicit (lower, upper) pairs.
    pub fn new(bounds: Vec<(f64, f64)>) -> Self {
        AxisBounds::Explicit(Arc::new(bounds))
    }

    /// The bounds of cell `index`, if in range.
    pub fn get(&self, index: usize) -> Option<(f64, f64)> {
        match self {
            AxisBounds::Explicit(bounds) => bounds.get(index).copied(),
            AxisBounds::Strided { inner, start, step } => inner.get(start + index * step),
        }
    }

    /// A lazy view selecting every `step`-th entry beginning at `start`.
    pub fn strided(&self, start: usize, step: usize) -> Self {
        AxisBounds::Strided {
            inner: Arc::new(self.clone()),
            start,
            step,
        }
    }
}

/// A named coordinate dimension of a domain.
#[derive(Debug, Clone)]
pub struct Axis {
    /// Identifier, unique within the domain's axis set.
    pub key: String,
    /// Component identifiers packed into each value.
    ///
    /// For a primitive axis this is `[key]`; for a composite axis it names
    /// the semantic components of each tuple, e.g. `["x", "y"]`.
    pub coordinates: Vec<String>,
    /// Ordered coordinate values. Never empty.
    pub values: AxisValues,
    /// Optional per-index cell extents.
    pub bounds: Option<AxisBounds>,
}

impl Axis {
    /// Create a primitive axis whose single component is the axis key.
    pub fn primitive(key: impl Into<String>, values: impl Into<AxisValues>) -> Self {
        let key = key.into();
        Self {
            coordinates: vec![key.clone()],
            key,
            values: values.into(),
            bounds: None,
        }
    }

    /// Create a composite axis with explicit component identifiers.
    pub fn composite(
        key: impl Into<String>,
        coordinates: Vec<String>,
        values: AxisValues,
    ) -> Self {
        Self {
            key: key.into(),
            coordinates,
            values,
            bounds: None,
        }
    }

    /// Attach per-index bounds.
    pub fn with_bounds(mut self, bounds: AxisBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Number of coordinate values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the axis has no values. Valid axes never do.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
