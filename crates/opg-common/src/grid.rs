//! Row-major 2-D grids.
//!
//! Every spatial layer in the workspace (elevation, facet ids, orientation,
//! coordinate meshes, one time step of a reanalysis field) is a [`Grid`].
//! Row 0 is the first row read from the source, so for ERA5 data it is the
//! northernmost latitude.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{OpgError, OpgResult};

/// Dimensions of a grid as (rows, cols).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// A dense 2-D array stored in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    shape: Shape,
    data: Vec<T>,
}

impl<T> Grid<T> {
    /// Build a grid from row-major data.
    ///
    /// Fails when `data.len()` does not equal `rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<T>) -> OpgResult<Self> {
        let shape = Shape::new(rows, cols);
        if data.len() != shape.len() {
            return Err(OpgError::BadGridLength {
                shape,
                expected: shape.len(),
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Build a grid from a list of equal-length rows.
    pub fn from_rows(rows: Vec<Vec<T>>) -> OpgResult<Self> {
        let nrows = rows.len();
        let ncols = rows.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(nrows * ncols);
        for row in rows {
            if row.len() != ncols {
                return Err(OpgError::BadGridLength {
                    shape: Shape::new(nrows, ncols),
                    expected: ncols,
                    actual: row.len(),
                });
            }
            data.extend(row);
        }
        Self::new(nrows, ncols, data)
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn rows(&self) -> usize {
        self.shape.rows
    }

    pub fn cols(&self) -> usize {
        self.shape.cols
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Cell at (row, col), or `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row >= self.shape.rows || col >= self.shape.cols {
            return None;
        }
        self.data.get(row * self.shape.cols + col)
    }

    /// Row-major view of the cells.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Iterate cells with their (row, col) position.
    pub fn indexed_iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
        let cols = self.shape.cols;
        self.data
            .iter()
            .enumerate()
            .map(move |(idx, value)| ((idx / cols, idx % cols), value))
    }

    /// Apply `f` to every cell, keeping the shape.
    pub fn map<U, F>(&self, f: F) -> Grid<U>
    where
        F: FnMut(&T) -> U,
    {
        Grid {
            shape: self.shape,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Error unless `other` has the same shape.
    pub fn ensure_same_shape<U>(&self, name: &str, other: &Grid<U>, other_name: &str) -> OpgResult<()> {
        if self.shape != other.shape {
            return Err(OpgError::ShapeMismatch {
                left: name.to_string(),
                left_shape: self.shape,
                right: other_name.to_string(),
                right_shape: other.shape,
            });
        }
        Ok(())
    }
}

impl<T: Clone> Grid<T> {
    /// A grid with every cell set to `value`.
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            shape: Shape::new(rows, cols),
            data: vec![value; rows * cols],
        }
    }
}

impl Grid<f64> {
    /// Minimum and maximum over the finite cells.
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        self.data
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
