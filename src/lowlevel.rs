//! Low-level building blocks for custom post-processing pipelines.
//!
//! Most users should prefer [`crate::select_candidates`] and
//! [`crate::recall`]. These items expose the individual stages.

pub use crate::boxes::decode::{decode_box, DeltaNorm};
pub use crate::boxes::overlap::{intersection, iou, iou_matrix};
pub use crate::candidate::nms::nms;
pub use crate::candidate::topk::{class_score, top_k, Scored, TopK};
pub use crate::eval::recall::MIN_LABELED_COLS;
pub use crate::select::MIN_RAW_COLS;
