//! Subset constraint types.
//!
//! Index constraints select axis indices directly; value constraints are
//! resolved against axis coordinate values first and then fed to index
//! subsetting.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Per-axis index constraints as supplied by callers.
pub type IndexConstraints = HashMap<String, IndexConstraint>;

/// Per-axis value constraints as supplied by callers.
pub type ValueConstraints = HashMap<String, ValueConstraint>;

/// An index-domain constraint for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexConstraint {
    /// Select exactly one index.
    Index(usize),
    /// Select `[start, stop)` with the given step. Omitted fields default
    /// to the full extent with step 1.
    Slice {
        start: Option<usize>,
        stop: Option<usize>,
        step: Option<usize>,
    },
}

impl IndexConstraint {
    /// A slice selecting `[start, stop)` with step 1.
    pub fn range(start: usize, stop: usize) -> Self {
        IndexConstraint::Slice {
            start: Some(start),
            stop: Some(stop),
            step: None,
        }
    }

    /// A slice selecting `[start, stop)` with the given step.
    pub fn strided(start: usize, stop: usize, step: usize) -> Self {
        IndexConstraint::Slice {
            start: Some(start),
            stop: Some(stop),
            step: Some(step),
        }
    }
}

impl From<usize> for IndexConstraint {
    fn from(index: usize) -> Self {
        IndexConstraint::Index(index)
    }
}

/// A normalized index constraint: `start < stop`, `step >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    pub start: usize,
    pub stop: usize,
    pub step: usize,
}

impl IndexRange {
    /// The full identity range over an axis of the given length.
    pub fn full(len: usize) -> Self {
        Self {
            start: 0,
            stop: len,
            step: 1,
        }
    }

    /// Whether this is the identity range over an axis of the given length.
    pub fn is_identity(&self, len: usize) -> bool {
        self.start == 0 && self.stop == len && self.step == 1
    }

    /// Number of indices selected.
    pub fn len(&self) -> usize {
        (self.stop - self.start).div_ceil(self.step)
    }

    /// Whether the range selects nothing. Normalized ranges never do.
    pub fn is_empty(&self) -> bool {
        self.start >= self.stop
    }

    /// Translate a subset index back to a source index.
    pub fn source_index(&self, index: usize) -> usize {
        self.start + index * self.step
    }
}

/// A scalar coordinate value used in value-domain constraints.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetValue {
    /// A numeric coordinate.
    Number(f64),
    /// A string coordinate, typically an ISO 8601 timestamp.
    String(String),
    /// A timestamp coordinate.
    Time(DateTime<Utc>),
}

impl From<f64> for TargetValue {
    fn from(value: f64) -> Self {
        TargetValue::Number(value)
    }
}

impl From<&str> for TargetValue {
    fn from(value: &str) -> Self {
        TargetValue::String(value.to_string())
    }
}

impl From<String> for TargetValue {
    fn from(value: String) -> Self {
        TargetValue::String(value)
    }
}

impl From<DateTime<Utc>> for TargetValue {
    fn from(value: DateTime<Utc>) -> Self {
        TargetValue::Time(value)
    }
}

impl std::fmt::Display for TargetValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetValue::Number(n) => write!(f, "{n}"),
            TargetValue::String(s) => write!(f, "{s}"),
            TargetValue::Time(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

/// A value-domain constraint for one axis.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueConstraint {
    /// Select the single index whose coordinate equals the value exactly.
    Exact(TargetValue),
    /// Select the index whose coordinate is nearest to the target.
    Nearest { target: TargetValue },
    /// Select all indices bracketing the `[start, stop]` coordinate
    /// interval.
    Interval { start: TargetValue, stop: TargetValue },
}

impl ValueConstraint {
    /// An exact-match constraint.
    pub fn exact(value: impl Into<TargetValue>) -> Self {
        ValueConstraint::Exact(value.into())
    }

    /// A nearest-match constraint.
    pub fn nearest(target: impl Into<TargetValue>) -> Self {
        ValueConstraint::Nearest {
            target: target.into(),
        }
    }

    /// A coordinate-interval constraint.
    pub fn interval(start: impl Into<TargetValue>, stop: impl Into<TargetValue>) -> Self {
        ValueConstraint::Interval {
            start: start.into(),
            stop: stop.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_range_len() {
        assert_eq!(IndexRange { start: 0, stop: 5, step: 1 }.len(), 5);
        assert_eq!(IndexRange { start: 0, stop: 5, step: 2 }.len(), 3);
        assert_eq!(IndexRange { start: 0, stop: 8, step: 3 }.len(), 3);
        assert_eq!(IndexRange { start: 2, stop: 3, step: 1 }.len(), 1);
    }

    #[test]
    fn test_source_index() {
        let range = IndexRange { start: 4, stop: 10, step: 2 };
        assert_eq!(range.source_index(0), 4);
        assert_eq!(range.source_index(2), 8);
    }

    #[test]
    fn test_identity() {
        assert!(IndexRange::full(7).is_identity(7));
        assert!(!IndexRange { start: 0, stop: 7, step: 2 }.is_identity(7));
    }
}
