//! Detection selection over raw network output.
//!
//! Each raw row is `4 + C` wide: four regression deltas followed by `C`
//! class confidences, background first. Per image the pipeline decodes the
//! deltas against the shared anchors, optionally keeps the Top-K anchors by
//! class score, optionally runs NMS and drops kept boxes below the
//! confidence threshold, then pads the result back to the Top-K width so a
//! batch stays rectangular. Padding rows are all zero.

use crate::boxes::decode::{decode_image, DeltaNorm};
use crate::boxes::{BBox, PixelConvention};
use crate::candidate::nms::nms;
use crate::candidate::topk::{class_score, top_k};
use crate::tensor::{Batch, BatchView, Matrix, MatrixView};
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::util::{DetPostError, DetPostResult};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

mod detections;

pub use detections::{Detection, Detections};

/// Smallest raw row: four deltas, the background slot and one class.
pub const MIN_RAW_COLS: usize = 6;

/// Selection stage parameters. `None` turns a stage into a pass-through.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectConfig {
    /// Number of anchors kept by class score before NMS.
    pub top_k: Option<usize>,
    /// IoU above which a lower scored box is suppressed.
    pub iou_thres: Option<f32>,
    /// Kept boxes scoring below this are dropped. Only applied with NMS.
    pub conf_thres: Option<f32>,
    /// Regression delta normalization.
    pub norm: DeltaNorm,
    /// Extent convention used for NMS overlap.
    pub nms_convention: PixelConvention,
    /// Process images of a batch in parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self {
            top_k: Some(100),
            iou_thres: Some(0.5),
            conf_thres: Some(0.5),
            norm: DeltaNorm::default(),
            nms_convention: PixelConvention::Inclusive,
            parallel: false,
        }
    }
}

impl SelectConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> DetPostResult<()> {
        if self.top_k == Some(0) {
            return Err(DetPostError::InvalidConfig("top_k must be at least 1"));
        }
        if let Some(t) = self.iou_thres {
            if !(0.0..=1.0).contains(&t) {
                return Err(DetPostError::InvalidConfig("iou_thres must be in [0, 1]"));
            }
        }
        if let Some(t) = self.conf_thres {
            if !t.is_finite() {
                return Err(DetPostError::InvalidConfig("conf_thres must be finite"));
            }
        }
        self.norm.validate()
    }

    /// Padded row count for images with `anchors` anchors.
    pub fn output_rows(&self, anchors: usize) -> usize {
        match self.top_k {
            Some(k) => k.min(anchors),
            None => anchors,
        }
    }
}

/// Runs selection for one image and returns the kept detections.
#[allow(clippy::neg_cmp_op_on_partial_ord)]
pub fn select_image(
    raw: MatrixView<'_>,
    anchors: &[BBox],
    cfg: &SelectConfig,
) -> DetPostResult<Detections> {
    if raw.cols() < MIN_RAW_COLS {
        return Err(DetPostError::TooFewColumns {
            what: "raw prediction rows",
            min: MIN_RAW_COLS,
            got: raw.cols(),
        });
    }
    let classes = raw.cols() - 4;
    let boxes = decode_image(anchors, raw, &cfg.norm)?;
    let confidences: Vec<&[f32]> = raw.iter_rows().map(|row| &row[4..]).collect();
    let scores: Vec<f32> = confidences.iter().map(|row| class_score(row)).collect();

    let candidates: Vec<usize> = match cfg.top_k {
        Some(k) => top_k(&scores, k),
        None => (0..boxes.len()).collect(),
    };
    let width = candidates.len();

    let kept: Vec<usize> = match cfg.iou_thres {
        Some(iou_thres) => {
            let cand_boxes: Vec<BBox> = candidates.iter().map(|&i| boxes[i]).collect();
            let cand_scores: Vec<f32> = candidates.iter().map(|&i| scores[i]).collect();
            let local = nms(&cand_boxes, &cand_scores, iou_thres, cfg.nms_convention)?;
            local
                .into_iter()
                .map(|pos| candidates[pos])
                // NaN scores are never below the threshold.
                .filter(|&i| match cfg.conf_thres {
                    Some(t) => !(scores[i] < t),
                    None => true,
                })
                .collect()
        }
        None => candidates,
    };

    trace_debug!("image_selected", kept = kept.len(), width = width);

    let items = kept
        .into_iter()
        .map(|anchor| Detection {
            anchor,
            bbox: boxes[anchor],
            score: scores[anchor],
            confidences: confidences[anchor].to_vec(),
        })
        .collect();
    Ok(Detections::new(width, classes, items))
}

/// Runs selection for every image of a batch, keeping explicit counts.
pub fn select_detections_batch(
    raw: BatchView<'_>,
    anchors: &[BBox],
    cfg: &SelectConfig,
) -> DetPostResult<Vec<Detections>> {
    cfg.validate()?;
    if raw.rows() != anchors.len() {
        return Err(DetPostError::ShapeMismatch {
            what: "rows per image vs anchors",
            expected: anchors.len(),
            got: raw.rows(),
        });
    }

    let _span = trace_span!(
        "select_candidates",
        images = raw.batch(),
        anchors = anchors.len()
    )
    .entered();

    let images: Vec<MatrixView<'_>> = raw.iter_images().collect();

    #[cfg(feature = "rayon")]
    let results: DetPostResult<Vec<Detections>> = if cfg.parallel {
        images
            .into_par_iter()
            .map(|image| select_image(image, anchors, cfg))
            .collect()
    } else {
        images
            .into_iter()
            .map(|image| select_image(image, anchors, cfg))
            .collect()
    };

    #[cfg(not(feature = "rayon"))]
    let results: DetPostResult<Vec<Detections>> = images
        .into_iter()
        .map(|image| select_image(image, anchors, cfg))
        .collect();

    let results = results?;
    trace_event!(
        "selection_done",
        images = results.len(),
        kept = results.iter().map(Detections::len).sum::<usize>()
    );
    Ok(results)
}

/// Selects detections for a batch of shape `(N, A, 4 + C)`.
///
/// Returns `(N, K, 4 + C)` where `K` is the Top-K width (or `A` without
/// Top-K). Rows after each image's kept detections are zero.
pub fn select_candidates_batch(
    raw: BatchView<'_>,
    anchors: &[BBox],
    cfg: &SelectConfig,
) -> DetPostResult<Batch> {
    let per_image = select_detections_batch(raw, anchors, cfg)?;
    let padded: Vec<Matrix> = per_image.iter().map(Detections::to_padded).collect();
    Batch::stack(padded, cfg.output_rows(anchors.len()), raw.cols())
}

/// Selects detections for a single image of shape `(A, 4 + C)`.
///
/// Equivalent to a batch of one with the batch dimension removed.
pub fn select_candidates(
    raw: MatrixView<'_>,
    anchors: &[BBox],
    cfg: &SelectConfig,
) -> DetPostResult<Matrix> {
    select_candidates_batch(BatchView::single(raw), anchors, cfg)?.into_single()
}
