//! Batched 3D arrays of shape `(batch, rows, cols)`.

use super::{required_len, Matrix, MatrixView};
use crate::util::{DetPostError, DetPostResult};

/// Borrowed view over a batch of equally shaped matrices.
#[derive(Copy, Clone, Debug)]
pub struct BatchView<'a> {
    data: &'a [f32],
    batch: usize,
    rows: usize,
    cols: usize,
    row_stride: usize,
    image_stride: usize,
}

impl<'a> BatchView<'a> {
    /// Creates a contiguous batch view over `batch * rows * cols` elements.
    pub fn from_slice(
        data: &'a [f32],
        batch: usize,
        rows: usize,
        cols: usize,
    ) -> DetPostResult<Self> {
        let per_image = required_len(rows, cols, cols)?;
        let needed = per_image
            .checked_mul(batch)
            .ok_or(DetPostError::InvalidDimensions { rows, cols })?;
        if data.len() < needed {
            return Err(DetPostError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            batch,
            rows,
            cols,
            row_stride: cols,
            image_stride: per_image,
        })
    }

    /// Lifts a single matrix into a batch of one.
    pub fn single(view: MatrixView<'a>) -> Self {
        Self {
            data: view.data,
            batch: 1,
            rows: view.rows,
            cols: view.cols,
            row_stride: view.stride,
            image_stride: 0,
        }
    }

    /// Returns the number of images in the batch.
    pub fn batch(&self) -> usize {
        self.batch
    }

    /// Returns the number of rows per image.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns per row.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns `(batch, rows, cols)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.batch, self.rows, self.cols)
    }

    /// Returns the matrix for image `index` if it is within bounds.
    pub fn image(&self, index: usize) -> Option<MatrixView<'a>> {
        if index >= self.batch {
            return None;
        }
        let start = index.checked_mul(self.image_stride)?;
        let data = self.data.get(start..)?;
        MatrixView::new(data, self.rows, self.cols, self.row_stride).ok()
    }

    /// Iterates over the images in order.
    pub fn iter_images(&self) -> impl ExactSizeIterator<Item = MatrixView<'a>> + 'a {
        let view = *self;
        (0..self.batch).map(move |index| {
            let start = index * view.image_stride;
            MatrixView {
                data: &view.data[start..],
                rows: view.rows,
                cols: view.cols,
                stride: view.row_stride,
            }
        })
    }
}

/// Owned contiguous batch of equally shaped matrices.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    data: Vec<f32>,
    batch: usize,
    rows: usize,
    cols: usize,
}

impl Batch {
    /// Creates a zero-filled batch.
    pub fn zeros(batch: usize, rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; batch * rows * cols],
            batch,
            rows,
            cols,
        }
    }

    /// Stacks matrices that all share the same shape.
    ///
    /// `rows` and `cols` describe the image shape and are used when
    /// `images` is empty.
    pub fn stack(images: Vec<Matrix>, rows: usize, cols: usize) -> DetPostResult<Self> {
        let batch = images.len();
        let mut data = Vec::with_capacity(batch * rows * cols);
        for image in images {
            if image.rows() != rows {
                return Err(DetPostError::ShapeMismatch {
                    what: "stacked image rows",
                    expected: rows,
                    got: image.rows(),
                });
            }
            if image.cols() != cols {
                return Err(DetPostError::ShapeMismatch {
                    what: "stacked image columns",
                    expected: cols,
                    got: image.cols(),
                });
            }
            data.extend_from_slice(image.data());
        }
        Ok(Self {
            data,
            batch,
            rows,
            cols,
        })
    }

    /// Returns the number of images in the batch.
    pub fn batch(&self) -> usize {
        self.batch
    }

    /// Returns the number of rows per image.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns per row.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns `(batch, rows, cols)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.batch, self.rows, self.cols)
    }

    /// Returns a borrowed view of the batch.
    pub fn view(&self) -> BatchView<'_> {
        BatchView {
            data: &self.data,
            batch: self.batch,
            rows: self.rows,
            cols: self.cols,
            row_stride: self.cols,
            image_stride: self.rows * self.cols,
        }
    }

    /// Returns the matrix for image `index` if it is within bounds.
    pub fn image(&self, index: usize) -> Option<MatrixView<'_>> {
        self.view().image(index)
    }

    /// Returns the contiguous backing buffer.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Consumes the batch, returning its backing buffer.
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Drops the batch dimension of a batch of one.
    pub fn into_single(self) -> DetPostResult<Matrix> {
        if self.batch != 1 {
            return Err(DetPostError::ShapeMismatch {
                what: "batch size",
                expected: 1,
                got: self.batch,
            });
        }
        Matrix::new(self.data, self.rows, self.cols)
    }
}
