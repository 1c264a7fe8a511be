use detpost::{recall, BatchView, DetPostError, PixelConvention, RecallStats};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const COLS: usize = 7;

fn row(x1: f32, y1: f32, x2: f32, y2: f32, class: usize) -> [f32; COLS] {
    let mut out = [x1, y1, x2, y2, 1.0, 0.0, 0.0];
    out[5 + class] = 1.0;
    out
}

fn flatten(rows: &[[f32; COLS]]) -> Vec<f32> {
    rows.iter().flat_map(|r| r.iter().copied()).collect()
}

#[test]
fn identical_prediction_gives_full_recall() {
    let gt = [0.0f32, 0.0, 10.0, 10.0, 1.0, 0.0, 1.0];
    let preds = gt;
    let gt = BatchView::from_slice(&gt, 1, 1, COLS).unwrap();
    let preds = BatchView::from_slice(&preds, 1, 1, COLS).unwrap();

    let r = recall(gt, preds, 0.5, PixelConvention::Continuous).unwrap();
    assert!((r - 1.0).abs() < 1e-6);
}

#[test]
fn missing_ground_truth_is_a_domain_error() {
    let gt = [0.0f32; 2 * COLS];
    let preds = flatten(&[row(0.0, 0.0, 5.0, 5.0, 0), row(1.0, 1.0, 4.0, 4.0, 1)]);
    let gt = BatchView::from_slice(&gt, 1, 2, COLS).unwrap();
    let preds = BatchView::from_slice(&preds, 1, 2, COLS).unwrap();

    let err = recall(gt, preds, 0.5, PixelConvention::Continuous)
        .err()
        .unwrap();
    assert_eq!(err, DetPostError::NoGroundTruth);

    let empty = BatchView::from_slice(&[], 0, 2, COLS).unwrap();
    let err = recall(empty, empty, 0.5, PixelConvention::Continuous)
        .err()
        .unwrap();
    assert_eq!(err, DetPostError::NoGroundTruth);
}

#[test]
fn empty_predictions_give_zero_recall() {
    let gt = flatten(&[row(0.0, 0.0, 5.0, 5.0, 0), row(10.0, 10.0, 20.0, 20.0, 1)]);
    let preds = [0.0f32; 2 * COLS];
    let gt = BatchView::from_slice(&gt, 1, 2, COLS).unwrap();
    let preds = BatchView::from_slice(&preds, 1, 2, COLS).unwrap();

    let stats = RecallStats::evaluate(gt, preds, 0.5, PixelConvention::Continuous).unwrap();
    assert_eq!(
        stats,
        RecallStats {
            true_positives: 0,
            ground_truth: 2,
        }
    );
    assert_eq!(stats.ratio().unwrap(), 0.0);
}

#[test]
fn class_mismatch_is_not_a_hit() {
    let gt = row(0.0, 0.0, 10.0, 10.0, 0);
    let preds = row(0.0, 0.0, 10.0, 10.0, 1);
    let gt = BatchView::from_slice(&gt, 1, 1, COLS).unwrap();
    let preds = BatchView::from_slice(&preds, 1, 1, COLS).unwrap();

    let r = recall(gt, preds, 0.5, PixelConvention::Continuous).unwrap();
    assert_eq!(r, 0.0);
}

#[test]
fn overlap_must_exceed_threshold() {
    let gt = row(0.0, 0.0, 10.0, 10.0, 1);
    let preds = row(0.0, 0.0, 10.0, 5.0, 1);
    let gt = BatchView::from_slice(&gt, 1, 1, COLS).unwrap();
    let preds = BatchView::from_slice(&preds, 1, 1, COLS).unwrap();

    assert_eq!(
        recall(gt, preds, 0.5, PixelConvention::Continuous).unwrap(),
        0.0
    );
    assert_eq!(
        recall(gt, preds, 0.49, PixelConvention::Continuous).unwrap(),
        1.0
    );
}

#[test]
fn best_overlap_decides_the_class_check() {
    // The closer prediction has the wrong class; the farther one is ignored.
    let gt = row(0.0, 0.0, 10.0, 10.0, 0);
    let preds = flatten(&[row(0.0, 0.0, 10.0, 9.0, 1), row(0.0, 0.0, 10.0, 7.0, 0)]);
    let gt = BatchView::from_slice(&gt, 1, 1, COLS).unwrap();
    let preds = BatchView::from_slice(&preds, 1, 2, COLS).unwrap();

    assert_eq!(
        recall(gt, preds, 0.5, PixelConvention::Continuous).unwrap(),
        0.0
    );
}

#[test]
fn recall_pools_counts_across_images() {
    let zero = [0.0f32; COLS];
    let gt = flatten(&[
        row(0.0, 0.0, 10.0, 10.0, 0),
        zero,
        zero,
        row(0.0, 0.0, 10.0, 10.0, 0),
        row(20.0, 20.0, 30.0, 30.0, 1),
        row(40.0, 40.0, 50.0, 50.0, 1),
    ]);
    let preds = flatten(&[
        row(0.0, 0.0, 10.0, 10.0, 0),
        zero,
        zero,
        zero,
        zero,
        zero,
    ]);
    let gt = BatchView::from_slice(&gt, 2, 3, COLS).unwrap();
    let preds = BatchView::from_slice(&preds, 2, 3, COLS).unwrap();

    let r = recall(gt, preds, 0.5, PixelConvention::Continuous).unwrap();
    assert!((r - 0.25).abs() < 1e-6);
}

#[test]
fn recall_does_not_increase_with_threshold() {
    let mut rng = StdRng::seed_from_u64(21);
    let images = 4;
    let rows = 12;
    let mut gt = Vec::with_capacity(images * rows * COLS);
    let mut preds = Vec::with_capacity(images * rows * COLS);
    for _ in 0..images * rows {
        let x1 = rng.random_range(1.0f32..100.0);
        let y1 = rng.random_range(1.0f32..100.0);
        let class = rng.random_range(0..2usize);
        gt.extend_from_slice(&row(x1, y1, x1 + 20.0, y1 + 20.0, class));

        let jitter = rng.random_range(-6.0f32..6.0);
        let pred_class = if rng.random_bool(0.8) { class } else { 1 - class };
        preds.extend_from_slice(&row(
            x1 + jitter,
            y1,
            x1 + 20.0 + jitter,
            y1 + 20.0,
            pred_class,
        ));
    }
    let gt = BatchView::from_slice(&gt, images, rows, COLS).unwrap();
    let preds = BatchView::from_slice(&preds, images, rows, COLS).unwrap();

    let mut previous = f32::INFINITY;
    for step in 0..=20 {
        let thres = step as f32 / 20.0;
        let r = recall(gt, preds, thres, PixelConvention::Continuous).unwrap();
        assert!((0.0..=1.0).contains(&r));
        assert!(r <= previous);
        previous = r;
    }
}

#[test]
fn batch_sizes_must_agree() {
    let gt = row(0.0, 0.0, 10.0, 10.0, 0);
    let gt = BatchView::from_slice(&gt, 1, 1, COLS).unwrap();
    let preds = BatchView::from_slice(&[], 2, 0, COLS).unwrap();

    let err = recall(gt, preds, 0.5, PixelConvention::Continuous)
        .err()
        .unwrap();
    assert_eq!(
        err,
        DetPostError::ShapeMismatch {
            what: "prediction images vs ground-truth images",
            expected: 1,
            got: 2,
        }
    );
}

#[test]
fn rows_without_class_scores_are_rejected() {
    let gt = [0.0f32, 0.0, 10.0, 10.0, 1.0];
    let gt = BatchView::from_slice(&gt, 1, 1, 5).unwrap();
    let preds = row(0.0, 0.0, 10.0, 10.0, 0);
    let preds = BatchView::from_slice(&preds, 1, 1, COLS).unwrap();

    let err = recall(gt, preds, 0.5, PixelConvention::Continuous)
        .err()
        .unwrap();
    assert_eq!(
        err,
        DetPostError::TooFewColumns {
            what: "ground-truth rows",
            min: 6,
            got: 5,
        }
    );
}
