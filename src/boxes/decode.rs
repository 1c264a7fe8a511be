//! Anchor-relative regression decoding.
//!
//! Each delta row `(dx, dy, dw, dh)` is first un-normalized with
//! `delta * std + mean`. The center moves by `dx * width` and `dy * height`;
//! the extent scales by `exp(dw)` and `exp(dh)`, which keeps decoded sizes
//! positive for any finite delta. Anchor extents use the inclusive pixel
//! convention. Non-finite inputs propagate unchanged.

use crate::boxes::{BBox, PixelConvention};
use crate::tensor::{Batch, BatchView, Matrix, MatrixView};
use crate::util::{DetPostError, DetPostResult};

/// Per-coordinate normalization applied to raw regression deltas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeltaNorm {
    /// Added after scaling, ordered `(dx, dy, dw, dh)`.
    pub mean: [f32; 4],
    /// Scale applied to the raw delta, ordered `(dx, dy, dw, dh)`.
    pub std: [f32; 4],
}

impl Default for DeltaNorm {
    fn default() -> Self {
        Self {
            mean: [0.0; 4],
            std: [0.1, 0.1, 0.2, 0.2],
        }
    }
}

impl DeltaNorm {
    /// Validates that all constants are finite.
    pub fn validate(&self) -> DetPostResult<()> {
        let finite = self
            .mean
            .iter()
            .chain(self.std.iter())
            .all(|value| value.is_finite());
        if !finite {
            return Err(DetPostError::InvalidConfig(
                "delta normalization constants must be finite",
            ));
        }
        Ok(())
    }

    #[inline]
    fn apply(&self, raw: &[f32]) -> [f32; 4] {
        let mut out = [0.0f32; 4];
        for (i, value) in out.iter_mut().enumerate() {
            *value = raw[i] * self.std[i] + self.mean[i];
        }
        out
    }
}

/// Decodes a single un-normalized delta against its anchor.
#[inline]
pub fn decode_box(anchor: &BBox, delta: [f32; 4], convention: PixelConvention) -> BBox {
    let [dx, dy, dw, dh] = delta;
    let width = anchor.width(convention);
    let height = anchor.height(convention);
    let (cx, cy) = anchor.center(convention);

    BBox::from_center(
        cx + dx * width,
        cy + dy * height,
        dw.exp() * width,
        dh.exp() * height,
    )
}

/// Decodes one image worth of deltas, shape `(A, 4+)`, against `A` anchors.
///
/// Only the first four columns of each row are read, so raw network rows
/// that carry class scores after the deltas can be passed directly.
pub fn decode_image(
    anchors: &[BBox],
    deltas: MatrixView<'_>,
    norm: &DeltaNorm,
) -> DetPostResult<Vec<BBox>> {
    if deltas.rows() != anchors.len() {
        return Err(DetPostError::ShapeMismatch {
            what: "deltas per image vs anchors",
            expected: anchors.len(),
            got: deltas.rows(),
        });
    }
    if deltas.cols() < 4 {
        return Err(DetPostError::TooFewColumns {
            what: "regression deltas",
            min: 4,
            got: deltas.cols(),
        });
    }

    Ok(anchors
        .iter()
        .zip(deltas.iter_rows())
        .map(|(anchor, raw)| decode_box(anchor, norm.apply(raw), PixelConvention::Inclusive))
        .collect())
}

/// Decodes a batch of deltas, shape `(N, A, 4+)`, into boxes of shape `(N, A, 4)`.
pub fn decode(anchors: &[BBox], deltas: BatchView<'_>, norm: &DeltaNorm) -> DetPostResult<Batch> {
    let mut images = Vec::with_capacity(deltas.batch());
    for image in deltas.iter_images() {
        let boxes = decode_image(anchors, image, norm)?;
        images.push(boxes_to_matrix(&boxes));
    }
    Batch::stack(images, anchors.len(), 4)
}

pub(crate) fn boxes_to_matrix(boxes: &[BBox]) -> Matrix {
    let mut out = Matrix::zeros(boxes.len(), 4);
    for (idx, b) in boxes.iter().enumerate() {
        if let Some(row) = out.row_mut(idx) {
            row.copy_from_slice(&b.to_array());
        }
    }
    out
}
