//! Small reductions over score rows.

/// Index of the first maximum, or `None` for an empty slice.
///
/// NaN entries never win against a finite value, but a row made only of NaN
/// still yields index 0.
pub(crate) fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &value) in values.iter().enumerate() {
        match best {
            None => best = Some((idx, value)),
            Some((_, current)) if value > current || (current.is_nan() && !value.is_nan()) => {
                best = Some((idx, value));
            }
            _ => {}
        }
    }
    best.map(|(idx, _)| idx)
}

/// Maximum value of a slice, `NEG_INFINITY` when empty. NaN propagates.
pub(crate) fn max_value(values: &[f32]) -> f32 {
    values.iter().copied().fold(f32::NEG_INFINITY, |acc, value| {
        if acc.is_nan() || value.is_nan() {
            f32::NAN
        } else {
            acc.max(value)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{argmax, max_value};

    #[test]
    fn argmax_prefers_first_of_equal_values() {
        assert_eq!(argmax(&[0.2, 0.7, 0.7, 0.1]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn argmax_skips_leading_nan() {
        assert_eq!(argmax(&[f32::NAN, 0.3, 0.1]), Some(1));
        assert_eq!(argmax(&[f32::NAN, f32::NAN]), Some(0));
    }

    #[test]
    fn max_value_of_empty_is_negative_infinity() {
        assert_eq!(max_value(&[]), f32::NEG_INFINITY);
        assert!((max_value(&[0.1, 0.9, 0.4]) - 0.9).abs() < 1e-6);
        assert!(max_value(&[0.1, f32::NAN]).is_nan());
    }
}
