//! IoU- and class-matched recall.

use crate::boxes::overlap::iou_matrix;
use crate::boxes::{BBox, PixelConvention};
use crate::eval::is_absent;
use crate::tensor::{BatchView, MatrixView};
use crate::trace::{trace_event, trace_span};
use crate::util::math::argmax;
use crate::util::{DetPostError, DetPostResult};

/// Column where the class scores start.
const CLASS_OFFSET: usize = 5;
/// Smallest labeled row: box, presence/background slot and one class.
pub const MIN_LABELED_COLS: usize = CLASS_OFFSET + 1;

/// Recall counts that can be accumulated across batches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecallStats {
    /// Ground-truth boxes matched by a prediction.
    pub true_positives: usize,
    /// Ground-truth boxes seen.
    pub ground_truth: usize,
}

impl RecallStats {
    /// Counts matches for one image.
    ///
    /// Each ground-truth box is paired with the prediction of highest IoU
    /// (first one on ties). It counts as matched when that IoU is greater
    /// than `iou_thres` and the prediction's arg-max class equals the
    /// ground-truth class.
    pub fn evaluate_image(
        ground_truth: MatrixView<'_>,
        predictions: MatrixView<'_>,
        iou_thres: f32,
        convention: PixelConvention,
    ) -> DetPostResult<Self> {
        check_cols("ground-truth rows", ground_truth.cols())?;
        check_cols("prediction rows", predictions.cols())?;

        let (gt_boxes, gt_labels) = present_rows(ground_truth);
        let mut stats = Self {
            true_positives: 0,
            ground_truth: gt_boxes.len(),
        };
        let (pred_boxes, pred_labels) = present_rows(predictions);
        if pred_boxes.is_empty() || gt_boxes.is_empty() {
            return Ok(stats);
        }

        let overlaps = iou_matrix(&gt_boxes, &pred_boxes, convention);
        for (gt_idx, gt_label) in gt_labels.iter().enumerate() {
            let Some(row) = overlaps.row(gt_idx) else {
                continue;
            };
            let Some(best) = argmax(row) else {
                continue;
            };
            if row[best] > iou_thres && pred_labels[best] == *gt_label {
                stats.true_positives += 1;
            }
        }
        Ok(stats)
    }

    /// Counts matches over a batch, image by image.
    pub fn evaluate(
        ground_truth: BatchView<'_>,
        predictions: BatchView<'_>,
        iou_thres: f32,
        convention: PixelConvention,
    ) -> DetPostResult<Self> {
        if ground_truth.batch() != predictions.batch() {
            return Err(DetPostError::ShapeMismatch {
                what: "prediction images vs ground-truth images",
                expected: ground_truth.batch(),
                got: predictions.batch(),
            });
        }

        let _span = trace_span!("recall", images = ground_truth.batch()).entered();
        let mut total = Self::default();
        for (gt, preds) in ground_truth.iter_images().zip(predictions.iter_images()) {
            total = total.merge(Self::evaluate_image(gt, preds, iou_thres, convention)?);
        }
        trace_event!(
            "recall_counts",
            true_positives = total.true_positives,
            ground_truth = total.ground_truth
        );
        Ok(total)
    }

    /// Sums two sets of counts.
    pub fn merge(self, other: Self) -> Self {
        Self {
            true_positives: self.true_positives + other.true_positives,
            ground_truth: self.ground_truth + other.ground_truth,
        }
    }

    /// Recall as `true_positives / ground_truth`.
    pub fn ratio(&self) -> DetPostResult<f32> {
        if self.ground_truth == 0 {
            return Err(DetPostError::NoGroundTruth);
        }
        Ok(self.true_positives as f32 / self.ground_truth as f32)
    }
}

/// Recall over a batch: matched ground-truth boxes over all ground-truth
/// boxes, pooled across images.
///
/// Fails with [`DetPostError::NoGroundTruth`] when no image carries a
/// ground-truth box.
pub fn recall(
    ground_truth: BatchView<'_>,
    predictions: BatchView<'_>,
    iou_thres: f32,
    convention: PixelConvention,
) -> DetPostResult<f32> {
    RecallStats::evaluate(ground_truth, predictions, iou_thres, convention)?.ratio()
}

fn check_cols(what: &'static str, cols: usize) -> DetPostResult<()> {
    if cols < MIN_LABELED_COLS {
        return Err(DetPostError::TooFewColumns {
            what,
            min: MIN_LABELED_COLS,
            got: cols,
        });
    }
    Ok(())
}

fn present_rows(view: MatrixView<'_>) -> (Vec<BBox>, Vec<Option<usize>>) {
    view.iter_rows()
        .filter(|row| !is_absent(row))
        .filter_map(|row| Some((BBox::from_row(row)?, argmax(&row[CLASS_OFFSET..]))))
        .unzip()
}
