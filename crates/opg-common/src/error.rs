//! Error types shared by the loaders and renderers.

use thiserror::Error;

use crate::{FacetId, Shape};

/// Result type alias using OpgError.
pub type OpgResult<T> = Result<T, OpgError>;

/// Failures that are not tied to a particular file format.
#[derive(Debug, Error)]
pub enum OpgError {
    #[error("Shape mismatch: '{left}' is {left_shape} but '{right}' is {right_shape}")]
    ShapeMismatch {
        left: String,
        left_shape: Shape,
        right: String,
        right_shape: Shape,
    },

    #[error("Grid data has {actual} values, expected {expected} for {shape}")]
    BadGridLength {
        shape: Shape,
        expected: usize,
        actual: usize,
    },

    #[error("Facet {0} has no cells in the facet grid")]
    FacetNotFound(FacetId),

    #[error("Invalid geographic extent: {0}")]
    InvalidExtent(String),

    #[error("Invalid time specification: {0}")]
    InvalidTime(#[from] crate::time::TimeParseError),
}
