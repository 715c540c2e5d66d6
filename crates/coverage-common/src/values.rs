//! Shared, immutable axis value storage.
//!
//! Axis coordinate sequences are held behind [`SharedValues`], a cheaply
//! cloneable view into `Arc`-backed storage. Subsetting a contiguous range
//! produces a new view over the same backing allocation; strided subsetting
//! materializes a new allocation.

use std::sync::Arc;

/// A polygon ring: ordered (x, y) positions, closed or unclosed.
pub type Ring = Vec<[f64; 2]>;

/// Polygon coordinates: exterior ring first, then hole rings.
pub type PolygonCoords = Vec<Ring>;

/// An immutable, shareable slice of axis coordinate values.
#[derive(Debug, Clone)]
pub struct SharedValues<T> {
    data: Arc<[T]>,
    start: usize,
    len: usize,
}

impl<T: Clone> SharedValues<T> {
    /// Wrap a vector of values.
    pub fn new(values: Vec<T>) -> Self {
        let len = values.len();
        Self {
            data: values.into(),
            start: 0,
            len,
        }
    }

    /// Number of values in this view.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The value at `index`, if in bounds.
    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.len {
            self.data.get(self.start + index)
        } else {
            None
        }
    }

    /// The values of this view as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.data[self.start..self.start + self.len]
    }

    /// Iterate over the values of this view.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// A contiguous sub-view `[start, stop)` sharing the backing storage.
    ///
    /// `stop` is clamped to the view length.
    pub fn slice(&self, start: usize, stop: usize) -> Self {
        let stop = stop.min(self.len);
        let start = start.min(stop);
        Self {
            data: Arc::clone(&self.data),
            start: self.start + start,
            len: stop - start,
        }
    }

    /// A strided subset `[start, stop)` with the given step, copied into
    /// fresh storage.
    pub fn stride(&self, start: usize, stop: usize, step: usize) -> Self {
        let stop = stop.min(self.len);
        let values: Vec<T> = self.as_slice()[start.min(stop)..stop]
            .iter()
            .step_by(step.max(1))
            .cloned()
            .collect();
        Self::new(values)
    }

    /// Whether `other` is a view over the same backing allocation.
    pub fn shares_storage_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl<T: Clone> From<Vec<T>> for SharedValues<T> {
    fn from(values: Vec<T>) -> Self {
        Self::new(values)
    }
}

/// The coordinate values of one axis.
///
/// Primitive axes carry numbers or strings; composite axes carry
/// fixed-length numeric tuples or polygon loops.
#[derive(Debug, Clone)]
pub enum AxisValues {
    /// 1-D numeric coordinates.
    Numbers(SharedValues<f64>),
    /// 1-D string coordinates, typically ISO 8601 timestamps.
    Strings(SharedValues<String>),
    /// Fixed-length numeric tuples, e.g. packed (x, y) points.
    Tuples(SharedValues<Vec<f64>>),
    /// Polygons encoded as rings of (x, y) positions.
    Polygons(SharedValues<PolygonCoords>),
}

impl AxisValues {
    /// Number of coordinate values on the axis.
    pub fn len(&self) -> usize {
        match self {
            AxisValues::Numbers(v) => v.len(),
            AxisValues::Strings(v) => v.len(),
            AxisValues::Tuples(v) => v.len(),
            AxisValues::Polygons(v) => v.len(),
        }
    }

    /// Whether the axis has no values. Valid axes never do.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the values are single-component (numbers or strings).
    pub fn is_primitive(&self) -> bool {
        matches!(self, AxisValues::Numbers(_) | AxisValues::Strings(_))
    }

    /// The numeric values, if this is a numeric primitive axis.
    pub fn as_numbers(&self) -> Option<&[f64]> {
        match self {
            AxisValues::Numbers(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// The string values, if this is a string primitive axis.
    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            AxisValues::Strings(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// The tuple values, if this is a tuple composite axis.
    pub fn as_tuples(&self) -> Option<&[Vec<f64>]> {
        match self {
            AxisValues::Tuples(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// The polygon values, if this is a polygon composite axis.
    pub fn as_polygons(&self) -> Option<&[PolygonCoords]> {
        match self {
            AxisValues::Polygons(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// A contiguous sub-view sharing the backing storage.
    pub fn slice(&self, start: usize, stop: usize) -> Self {
        match self {
            AxisValues::Numbers(v) => AxisValues::Numbers(v.slice(start, stop)),
            AxisValues::Strings(v) => AxisValues::Strings(v.slice(start, stop)),
            AxisValues::Tuples(v) => AxisValues::Tuples(v.slice(start, stop)),
            AxisValues::Polygons(v) => AxisValues::Polygons(v.slice(start, stop)),
        }
    }

    /// A strided subset, copied into fresh storage of the same kind.
    pub fn stride(&self, start: usize, stop: usize, step: usize) -> Self {
        match self {
            AxisValues::Numbers(v) => AxisValues::Numbers(v.stride(start, stop, step)),
            AxisValues::Strings(v) => AxisValues::Strings(v.stride(start, stop, step)),
            AxisValues::Tuples(v) => AxisValues::Tuples(v.stride(start, stop, step)),
            AxisValues::Polygons(v) => AxisValues::Polygons(v.stride(start, stop, step)),
        }
    }
}

impl From<Vec<f64>> for AxisValues {
    fn from(values: Vec<f64>) -> Self {
        AxisValues::Numbers(SharedValues::new(values))
    }
}

impl From<Vec<String>> for AxisValues {
    fn from(values: Vec<String>) -> Self {
        AxisValues::Strings(SharedValues::new(values))
    }
}

impl From<Vec<&str>> for AxisValues {
    fn from(values: Vec<&str>) -> Self {
        AxisValues::Strings(SharedValues::new(
            values.into_iter().map(str::to_string).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_shares_storage() {
        let values = SharedValues::new(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let view = values.slice(1, 4);
        assert_eq!(view.as_slice(), &[2.0, 3.0, 4.0]);
        assert!(view.shares_storage_with(&values));
    }

    #[test]
    fn test_stride_copies() {
        let values = SharedValues::new(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let sampled = values.stride(1, 6, 2);
        assert_eq!(sampled.as_slice(), &[1.0, 3.0, 5.0]);
        assert!(!sampled.shares_storage_with(&values));
    }

    #[test]
    fn test_nested_slice() {
        let values = SharedValues::new(vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        let outer = values.slice(1, 5);
        let inner = outer.slice(1, 3);
        assert_eq!(inner.as_slice(), &[2.0, 3.0]);
        assert!(inner.shares_storage_with(&values));
    }

    #[test]
    fn test_axis_values_kinds() {
        let numbers = AxisValues::from(vec![1.0, 2.0]);
        assert!(numbers.is_primitive());
        assert_eq!(numbers.as_numbers(), Some(&[1.0, 2.0][..]));

        let tuples = AxisValues::Tuples(SharedValues::new(vec![vec![0.0, 1.0], vec![2.0, 3.0]]));
        assert!(!tuples.is_primitive());
        assert_eq!(tuples.len(), 2);
    }
}
