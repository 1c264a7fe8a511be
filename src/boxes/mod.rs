//! Axis-aligned boxes in corner form and the geometry built on them.
//!
//! Box widths depend on how corners are interpreted. Pixel-index boxes treat
//! both corners as inclusive (`width = x2 - x1 + 1`); continuous boxes use the
//! plain difference. The convention is carried explicitly as a
//! [`PixelConvention`] so callers choose it per operation.

use crate::tensor::MatrixView;
use crate::util::{DetPostError, DetPostResult};

pub mod decode;
pub mod overlap;

/// How box extents are measured from corner coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PixelConvention {
    /// Extent is `max - min`.
    #[default]
    Continuous,
    /// Both corners are inclusive pixel indices; extent is `max - min + 1`.
    Inclusive,
}

impl PixelConvention {
    /// Amount added to a corner difference to obtain an extent.
    #[inline]
    pub fn offset(self) -> f32 {
        match self {
            PixelConvention::Continuous => 0.0,
            PixelConvention::Inclusive => 1.0,
        }
    }
}

/// Box given by its top-left `(x1, y1)` and bottom-right `(x2, y2)` corners.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    /// Creates a box from its corners.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Reads the first four values of a row as `(x1, y1, x2, y2)`.
    ///
    /// Returns `None` when the row has fewer than four values.
    pub fn from_row(row: &[f32]) -> Option<Self> {
        match row {
            [x1, y1, x2, y2, ..] => Some(Self::new(*x1, *y1, *x2, *y2)),
            _ => None,
        }
    }

    /// Returns the corners as an array.
    pub fn to_array(self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    /// Horizontal extent under `convention`.
    #[inline]
    pub fn width(&self, convention: PixelConvention) -> f32 {
        self.x2 - self.x1 + convention.offset()
    }

    /// Vertical extent under `convention`.
    #[inline]
    pub fn height(&self, convention: PixelConvention) -> f32 {
        self.y2 - self.y1 + convention.offset()
    }

    /// Area under `convention`. Not clamped: inverted boxes give odd signs.
    #[inline]
    pub fn area(&self, convention: PixelConvention) -> f32 {
        self.width(convention) * self.height(convention)
    }

    /// Center point `(x, y)` under `convention`.
    #[inline]
    pub fn center(&self, convention: PixelConvention) -> (f32, f32) {
        (
            self.x1 + 0.5 * self.width(convention),
            self.y1 + 0.5 * self.height(convention),
        )
    }

    /// Builds a box from its center and extent.
    #[inline]
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x1: cx - 0.5 * width,
            y1: cy - 0.5 * height,
            x2: cx + 0.5 * width,
            y2: cy + 0.5 * height,
        }
    }
}

/// Reads an `(A, 4+)` array of anchor boxes.
pub fn anchors_from_view(view: MatrixView<'_>) -> DetPostResult<Vec<BBox>> {
    if view.cols() < 4 {
        return Err(DetPostError::TooFewColumns {
            what: "anchors",
            min: 4,
            got: view.cols(),
        });
    }
    Ok(view.iter_rows().filter_map(BBox::from_row).collect())
}
