//! Dense `f32` arrays used at the crate boundary.
//!
//! `MatrixView` is a borrowed 2D view into a 1D buffer with an explicit row
//! stride, counted in elements between the starts of consecutive rows. A
//! stride larger than the column count represents padded rows. Empty views
//! (zero rows) are valid: an image may legitimately carry no candidates.

use crate::util::{DetPostError, DetPostResult};

mod batch;

pub use batch::{Batch, BatchView};

/// Borrowed row-major matrix view with an explicit stride.
#[derive(Copy, Clone, Debug)]
pub struct MatrixView<'a> {
    data: &'a [f32],
    rows: usize,
    cols: usize,
    stride: usize,
}

impl<'a> MatrixView<'a> {
    /// Creates a contiguous view with `stride == cols`.
    pub fn from_slice(data: &'a [f32], rows: usize, cols: usize) -> DetPostResult<Self> {
        Self::new(data, rows, cols, cols)
    }

    /// Creates a view with an explicit stride.
    pub fn new(data: &'a [f32], rows: usize, cols: usize, stride: usize) -> DetPostResult<Self> {
        let needed = required_len(rows, cols, stride)?;
        if data.len() < needed {
            return Err(DetPostError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            rows,
            cols,
            stride,
        })
    }

    /// Returns the number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }

    /// Returns `true` when the view has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Returns the element at `(row, col)` if it is within bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        let idx = row.checked_mul(self.stride)?.checked_add(col)?;
        self.data.get(idx).copied()
    }

    /// Returns a contiguous slice for `row` with length `cols`.
    pub fn row(&self, row: usize) -> Option<&'a [f32]> {
        if row >= self.rows {
            return None;
        }
        let start = row.checked_mul(self.stride)?;
        let end = start.checked_add(self.cols)?;
        self.data.get(start..end)
    }

    /// Iterates over all rows in order.
    pub fn iter_rows(&self) -> impl ExactSizeIterator<Item = &'a [f32]> + 'a {
        let data = self.data;
        let cols = self.cols;
        let stride = self.stride;
        (0..self.rows).map(move |row| {
            let start = row * stride;
            &data[start..start + cols]
        })
    }

    /// Copies the view into a contiguous owned matrix.
    pub fn to_matrix(&self) -> Matrix {
        let mut data = Vec::with_capacity(self.rows * self.cols);
        for row in self.iter_rows() {
            data.extend_from_slice(row);
        }
        Matrix {
            data,
            rows: self.rows,
            cols: self.cols,
        }
    }
}

/// Owned contiguous row-major matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    data: Vec<f32>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// Wraps a contiguous buffer of exactly `rows * cols` elements.
    pub fn new(data: Vec<f32>, rows: usize, cols: usize) -> DetPostResult<Self> {
        let needed = required_len(rows, cols, cols)?;
        if data.len() != needed {
            return Err(DetPostError::ShapeMismatch {
                what: "matrix buffer length",
                expected: needed,
                got: data.len(),
            });
        }
        Ok(Self { data, rows, cols })
    }

    /// Creates a zero-filled matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Returns the number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns a borrowed view of the matrix.
    pub fn view(&self) -> MatrixView<'_> {
        MatrixView {
            data: &self.data,
            rows: self.rows,
            cols: self.cols,
            stride: self.cols,
        }
    }

    /// Returns the element at `(row, col)` if it is within bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        self.view().get(row, col)
    }

    /// Returns row `row` if it is within bounds.
    pub fn row(&self, row: usize) -> Option<&[f32]> {
        if row >= self.rows {
            return None;
        }
        let start = row * self.cols;
        self.data.get(start..start + self.cols)
    }

    /// Returns a mutable slice for row `row` if it is within bounds.
    pub fn row_mut(&mut self, row: usize) -> Option<&mut [f32]> {
        if row >= self.rows {
            return None;
        }
        let start = row * self.cols;
        self.data.get_mut(start..start + self.cols)
    }

    /// Returns the contiguous backing buffer.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Consumes the matrix, returning its backing buffer.
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

fn required_len(rows: usize, cols: usize, stride: usize) -> DetPostResult<usize> {
    if stride < cols {
        return Err(DetPostError::InvalidStride { cols, stride });
    }
    if rows == 0 || cols == 0 {
        return Ok(0);
    }
    (rows - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(cols))
        .ok_or(DetPostError::InvalidDimensions { rows, cols })
}
