//! Candidate selection and pruning utilities.
//!
//! Includes Top-K collection over per-anchor scores and greedy IoU-based
//! non-maximum suppression.

pub(crate) mod nms;
pub(crate) mod topk;
