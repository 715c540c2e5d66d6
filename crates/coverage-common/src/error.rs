//! Error types for coverage operations.

use thiserror::Error;

/// Result type alias using CoverageError.
pub type CoverageResult<T> = Result<T, CoverageError>;

/// Primary error type for coverage operations.
#[derive(Debug, Error)]
pub enum CoverageError {
    /// An argument was structurally invalid, e.g. an empty search sequence.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A malformed index constraint.
    #[error("invalid constraint for axis '{axis}': {message}")]
    InvalidConstraint { axis: String, message: String },

    /// An exact-match value subset missed.
    #[error("domain value not found on axis '{axis}': {value}")]
    ValueNotFound { axis: String, value: String },

    /// A value constraint whose shape or type does not fit the axis kind.
    #[error("invalid constraint type for axis '{axis}': {message}")]
    InvalidConstraintType { axis: String, message: String },

    /// The axis is not bound to a geodetic CRS at the longitude position.
    #[error("'{0}' is not a longitude axis")]
    NotALongitudeAxis(String),

    /// A time value that is neither a date nor a parsable ISO 8601 string.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// The domain referencing cannot support the requested operation.
    #[error("unsupported referencing: {0}")]
    UnsupportedReferencing(String),

    /// The coverage cannot be reprojected.
    #[error("unsupported reprojection: {0}")]
    UnsupportedReprojection(String),

    /// No projection cached for the CRS; use the explicit load path first.
    #[error("projection '{0}' not cached, load it explicitly first")]
    ProjectionNotCached(String),

    /// An object failed the structural checks for its declared type.
    #[error("not a valid {expected}: {message}")]
    TypeMismatch {
        expected: &'static str,
        message: String,
    },

    /// A category object is missing its identifier.
    #[error("invalid category: {0}")]
    InvalidCategory(String),
}
