//! Evaluation metrics over padded detection arrays.
//!
//! Rows follow the selection output layout: four box corners, one slot that
//! is the background score for predictions or a presence flag for ground
//! truth, then per-class scores. A row whose values are all zero is an empty
//! padding slot and is ignored.

pub mod recall;

/// Returns `true` for an all-zero padding row.
pub fn is_absent(row: &[f32]) -> bool {
    row.iter().all(|&value| value == 0.0)
}

#[cfg(test)]
mod tests {
    use super::is_absent;

    #[test]
    fn only_all_zero_rows_are_absent() {
        assert!(is_absent(&[0.0; 7]));
        assert!(is_absent(&[-0.0, 0.0]));
        assert!(!is_absent(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1e-9]));
        assert!(!is_absent(&[-1.0, 0.0]));
    }
}
