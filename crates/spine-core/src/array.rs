//! Fixed-width row arrays for structured per-voxel data.

use std::slice::{ChunksExact, ChunksExactMut};

use crate::error::ObjectError;

/// A row-major array of `len()` rows, each `dims()` elements wide.
///
/// Used for voxel coordinates (`dims = 3`) and `(module, tpc)` source
/// pairs (`dims = 2`). The width is carried at runtime so that merging
/// can reject arrays whose rows do not line up.
#[derive(Clone, Debug, PartialEq)]
pub struct RowArray<T> {
    dims: usize,
    data: Vec<T>,
}

impl<T: Copy> RowArray<T> {
    /// Create an empty array with rows of width `dims`.
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            data: Vec::new(),
        }
    }

    /// Wrap a flat row-major buffer.
    ///
    /// Returns `None` if `dims` is zero or `data.len()` is not a multiple
    /// of `dims`.
    pub fn from_flat(dims: usize, data: Vec<T>) -> Option<Self> {
        if dims == 0 || data.len() % dims != 0 {
            return None;
        }
        Some(Self { dims, data })
    }

    /// Build from fixed-size rows.
    pub fn from_rows<const D: usize>(rows: &[[T; D]]) -> Self {
        let mut data = Vec::with_capacity(rows.len() * D);
        for row in rows {
            data.extend_from_slice(row);
        }
        Self { dims: D, data }
    }

    /// Width of each row.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        if self.dims == 0 {
            0
        } else {
            self.data.len() / self.dims
        }
    }

    /// Whether the array holds no rows.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The flat row-major buffer.
    pub fn as_flat(&self) -> &[T] {
        &self.data
    }

    /// Consume the array and return the flat buffer.
    pub fn into_flat(self) -> Vec<T> {
        self.data
    }

    /// Row `i`, or `None` if out of bounds.
    pub fn row(&self, i: usize) -> Option<&[T]> {
        let start = i.checked_mul(self.dims)?;
        self.data.get(start..start + self.dims)
    }

    /// Iterate over rows.
    pub fn rows(&self) -> ChunksExact<'_, T> {
        self.data.chunks_exact(self.dims.max(1))
    }

    /// Iterate mutably over rows.
    pub fn rows_mut(&mut self) -> ChunksExactMut<'_, T> {
        self.data.chunks_exact_mut(self.dims.max(1))
    }

    /// Iterate over column `c` (empty if `c >= dims()`).
    pub fn column(&self, c: usize) -> impl Iterator<Item = T> + '_ {
        let take = if c < self.dims { self.len() } else { 0 };
        self.rows().take(take).map(move |row| row[c])
    }

    /// Append the rows of `other`.
    ///
    /// `field` only labels the error when the row widths differ.
    pub fn concat(&mut self, field: &str, other: &Self) -> Result<(), ObjectError> {
        if self.dims != other.dims {
            return Err(ObjectError::ShapeMismatch {
                field: field.to_string(),
                expected: self.dims,
                found: other.dims,
            });
        }
        self.data.extend_from_slice(&other.data);
        Ok(())
    }
}
