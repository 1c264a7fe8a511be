//! Top-K candidate selection over per-anchor scores.

use std::cmp::Ordering;

use crate::util::math::max_value;

/// Anchor index paired with its detection score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scored {
    /// Position of the candidate in its source array.
    pub index: usize,
    /// Max-over-class confidence.
    pub score: f32,
}

/// Descending score, ties broken by ascending index.
fn scored_cmp_desc(a: &Scored, b: &Scored) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.index.cmp(&b.index))
}

/// Sorts candidates by descending score with deterministic tie-breaking.
pub(crate) fn sort_scored_desc(items: &mut [Scored]) {
    items.sort_by(scored_cmp_desc);
}

/// Detection score of a confidence row: the max over all non-background
/// slots. Slot 0 is the background class. NaN propagates.
pub fn class_score(confidences: &[f32]) -> f32 {
    match confidences.split_first() {
        Some((_, classes)) => max_value(classes),
        None => f32::NEG_INFINITY,
    }
}

/// Returns the indices of the `k` highest scores, best first.
///
/// Equal scores keep ascending index order. NaN ranks above every number.
/// When `k` exceeds the number of scores every index is returned.
pub fn top_k(scores: &[f32], k: usize) -> Vec<usize> {
    if k == 0 || scores.is_empty() {
        return Vec::new();
    }

    let mut items: Vec<Scored> = scores
        .iter()
        .enumerate()
        .map(|(index, &score)| Scored { index, score })
        .collect();
    if k < items.len() {
        items.select_nth_unstable_by(k - 1, scored_cmp_desc);
        items.truncate(k);
    }
    sort_scored_desc(&mut items);
    items.into_iter().map(|item| item.index).collect()
}

/// Streaming Top-K container with O(k) insertion cost.
///
/// Produces the same order as [`top_k`] for the same pushed candidates.
pub struct TopK {
    k: usize,
    items: Vec<Scored>,
}

impl TopK {
    /// Creates a new Top-K collector.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            items: Vec::with_capacity(k),
        }
    }

    /// Pushes a candidate, evicting the lowest ranked one if at capacity.
    pub fn push(&mut self, item: Scored) {
        if self.k == 0 {
            return;
        }
        if self.items.len() < self.k {
            self.items.push(item);
            return;
        }

        let mut worst_idx = 0usize;
        for (idx, current) in self.items.iter().enumerate().skip(1) {
            if scored_cmp_desc(current, &self.items[worst_idx]) == Ordering::Greater {
                worst_idx = idx;
            }
        }

        if scored_cmp_desc(&item, &self.items[worst_idx]) == Ordering::Less {
            self.items[worst_idx] = item;
        }
    }

    /// Returns the number of retained candidates.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when nothing has been retained.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns candidates sorted by descending score.
    pub fn into_sorted_desc(mut self) -> Vec<Scored> {
        sort_scored_desc(&mut self.items);
        self.items
    }
}
