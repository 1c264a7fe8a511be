//! Greedy IoU-based non-maximum suppression.

use crate::boxes::overlap::iou_with_areas;
use crate::boxes::{BBox, PixelConvention};
use crate::candidate::topk::{sort_scored_desc, Scored};
use crate::util::{DetPostError, DetPostResult};

/// Applies greedy non-maximum suppression.
///
/// Candidates are visited by descending score (ties by ascending index). The
/// best remaining candidate is kept and every other remaining candidate whose
/// IoU with it is greater than `iou_thres` is dropped. Candidates with IoU
/// exactly equal to the threshold survive. Returns kept indices in the order
/// they were selected.
pub fn nms(
    boxes: &[BBox],
    scores: &[f32],
    iou_thres: f32,
    convention: PixelConvention,
) -> DetPostResult<Vec<usize>> {
    if boxes.len() != scores.len() {
        return Err(DetPostError::ShapeMismatch {
            what: "scores vs boxes",
            expected: boxes.len(),
            got: scores.len(),
        });
    }
    if boxes.is_empty() {
        return Ok(Vec::new());
    }

    let areas: Vec<f32> = boxes.iter().map(|b| b.area(convention)).collect();
    let mut order: Vec<Scored> = scores
        .iter()
        .enumerate()
        .map(|(index, &score)| Scored { index, score })
        .collect();
    sort_scored_desc(&mut order);
    let mut pending: Vec<usize> = order.into_iter().map(|s| s.index).collect();

    let mut keep = Vec::new();
    let mut cursor = 0usize;
    while cursor < pending.len() {
        let best = pending[cursor];
        keep.push(best);
        cursor += 1;

        let best_box = &boxes[best];
        let best_area = areas[best];
        let mut write = cursor;
        for read in cursor..pending.len() {
            let other = pending[read];
            let overlap = iou_with_areas(best_box, best_area, &boxes[other], areas[other], convention);
            // NaN overlap is dropped, matching a `<=` survivor test.
            if overlap <= iou_thres {
                pending[write] = other;
                write += 1;
            }
        }
        pending.truncate(write);
    }

    Ok(keep)
}
