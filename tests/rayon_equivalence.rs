#![cfg(feature = "rayon")]

use detpost::{select_candidates_batch, BBox, BatchView, SelectConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn make_anchors(count: usize) -> Vec<BBox> {
    (0..count)
        .map(|i| {
            let x = (i % 20) as f32 * 16.0;
            let y = (i / 20) as f32 * 16.0;
            BBox::new(x, y, x + 31.0, y + 31.0)
        })
        .collect()
}

#[test]
fn parallel_matches_sequential_selection() {
    let images = 8;
    let anchors = make_anchors(200);
    let cols = 4 + 5;
    let mut rng = StdRng::seed_from_u64(42);
    let raw: Vec<f32> = (0..images * anchors.len() * cols)
        .map(|_| rng.random_range(-1.0f32..1.0).abs())
        .collect();
    let batch = BatchView::from_slice(&raw, images, anchors.len(), cols).unwrap();

    let base_cfg = SelectConfig {
        top_k: Some(64),
        iou_thres: Some(0.45),
        conf_thres: Some(0.6),
        ..SelectConfig::default()
    };
    let seq_cfg = SelectConfig {
        parallel: false,
        ..base_cfg.clone()
    };
    let par_cfg = SelectConfig {
        parallel: true,
        ..base_cfg
    };

    let seq = select_candidates_batch(batch, &anchors, &seq_cfg).unwrap();
    let par = select_candidates_batch(batch, &anchors, &par_cfg).unwrap();

    assert_eq!(seq.shape(), (images, 64, cols));
    assert_eq!(seq, par);
}
