//! Per-image selection results with an explicit valid count.

use crate::boxes::BBox;
use crate::tensor::Matrix;
use crate::util::math::argmax;

/// A decoded box that survived selection.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Anchor index the box was decoded from.
    pub anchor: usize,
    /// Decoded corners.
    pub bbox: BBox,
    /// Max-over-class confidence, background excluded.
    pub score: f32,
    /// Full confidence row, background slot first.
    pub confidences: Vec<f32>,
}

impl Detection {
    /// Predicted class among the non-background slots (0-based).
    pub fn label(&self) -> Option<usize> {
        self.confidences.get(1..).and_then(argmax)
    }
}

/// Selected detections for one image.
///
/// `width` is the padded row count the image occupies in a batch output;
/// only the first `len()` rows carry detections.
#[derive(Clone, Debug, PartialEq)]
pub struct Detections {
    width: usize,
    classes: usize,
    items: Vec<Detection>,
}

impl Detections {
    pub(crate) fn new(width: usize, classes: usize, items: Vec<Detection>) -> Self {
        debug_assert!(items.len() <= width);
        Self {
            width,
            classes,
            items,
        }
    }

    /// Number of kept detections.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when nothing was kept.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Padded row count.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Confidence slots per row, background included.
    pub fn classes(&self) -> usize {
        self.classes
    }

    /// Kept detections in selection order.
    pub fn as_slice(&self) -> &[Detection] {
        &self.items
    }

    /// Iterates over kept detections.
    pub fn iter(&self) -> std::slice::Iter<'_, Detection> {
        self.items.iter()
    }

    /// Consumes the result, returning the kept detections.
    pub fn into_vec(self) -> Vec<Detection> {
        self.items
    }

    /// Materializes the `(width, 4 + classes)` array with zero rows after
    /// the kept detections.
    pub fn to_padded(&self) -> Matrix {
        let mut out = Matrix::zeros(self.width, 4 + self.classes);
        for (idx, det) in self.items.iter().enumerate() {
            if let Some(row) = out.row_mut(idx) {
                row[..4].copy_from_slice(&det.bbox.to_array());
                row[4..].copy_from_slice(&det.confidences);
            }
        }
        out
    }
}

impl<'a> IntoIterator for &'a Detections {
    type Item = &'a Detection;
    type IntoIter = std::slice::Iter<'a, Detection>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
