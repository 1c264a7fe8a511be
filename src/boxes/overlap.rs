//! Intersection-over-union between boxes.

use crate::boxes::{BBox, PixelConvention};
use crate::tensor::Matrix;

/// Intersection area of two boxes, zero when they do not overlap.
#[inline]
pub fn intersection(a: &BBox, b: &BBox, convention: PixelConvention) -> f32 {
    let offset = convention.offset();
    let iw = (a.x2.min(b.x2) - a.x1.max(b.x1) + offset).max(0.0);
    let ih = (a.y2.min(b.y2) - a.y1.max(b.y1) + offset).max(0.0);
    iw * ih
}

/// IoU of two boxes. The union is floored at `f32::EPSILON`.
#[inline]
pub fn iou(a: &BBox, b: &BBox, convention: PixelConvention) -> f32 {
    iou_with_areas(a, a.area(convention), b, b.area(convention), convention)
}

#[inline]
pub(crate) fn iou_with_areas(
    a: &BBox,
    area_a: f32,
    b: &BBox,
    area_b: f32,
    convention: PixelConvention,
) -> f32 {
    let inter = intersection(a, b, convention);
    let union = (area_a + area_b - inter).max(f32::EPSILON);
    inter / union
}

/// Pairwise IoU matrix of shape `(a.len(), b.len())`.
pub fn iou_matrix(a: &[BBox], b: &[BBox], convention: PixelConvention) -> Matrix {
    let areas_b: Vec<f32> = b.iter().map(|bb| bb.area(convention)).collect();
    let mut out = Matrix::zeros(a.len(), b.len());
    for (i, ba) in a.iter().enumerate() {
        let area_a = ba.area(convention);
        if let Some(row) = out.row_mut(i) {
            for ((value, bb), &area_b) in row.iter_mut().zip(b.iter()).zip(areas_b.iter()) {
                *value = iou_with_areas(ba, area_a, bb, area_b, convention);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{intersection, iou};
    use crate::boxes::{BBox, PixelConvention};

    #[test]
    fn disjoint_boxes_have_zero_overlap() {
        let a = BBox::new(0.0, 0.0, 1.0, 1.0);
        let b = BBox::new(5.0, 5.0, 6.0, 6.0);
        assert_eq!(intersection(&a, &b, PixelConvention::Inclusive), 0.0);
        assert_eq!(iou(&a, &b, PixelConvention::Continuous), 0.0);
    }

    #[test]
    fn half_shifted_boxes_match_hand_computation() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(5.0, 5.0, 15.0, 15.0);
        let continuous = iou(&a, &b, PixelConvention::Continuous);
        assert!((continuous - 25.0 / 175.0).abs() < 1e-6);
        let inclusive = iou(&a, &b, PixelConvention::Inclusive);
        assert!((inclusive - 36.0 / 206.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_pair_does_not_divide_by_zero() {
        let zero = BBox::default();
        assert_eq!(iou(&zero, &zero, PixelConvention::Continuous), 0.0);
    }
}
