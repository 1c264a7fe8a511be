//! detpost turns raw anchor-based detector output into final boxes.
//!
//! The pipeline decodes regression deltas against a shared anchor set,
//! bounds the candidate set with Top-K, removes duplicates with greedy IoU
//! non-maximum suppression and pads every image to a fixed row count. A
//! separate recall metric scores padded predictions against ground truth.
//! Per-image work can run in parallel via the `rayon` feature.

pub mod boxes;
mod candidate;
pub mod eval;
pub mod lowlevel;
pub mod select;
pub mod tensor;
mod trace;
pub mod util;

pub use boxes::decode::{decode, decode_image, DeltaNorm};
pub use boxes::overlap::{iou, iou_matrix};
pub use boxes::{anchors_from_view, BBox, PixelConvention};
pub use candidate::nms::nms;
pub use candidate::topk::{class_score, top_k};
pub use eval::is_absent;
pub use eval::recall::{recall, RecallStats};
pub use select::{
    select_candidates, select_candidates_batch, select_detections_batch, select_image, Detection,
    Detections, SelectConfig,
};
pub use tensor::{Batch, BatchView, Matrix, MatrixView};
pub use util::{DetPostError, DetPostResult};
