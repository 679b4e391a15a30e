//! Order statistics shared by the smoother and the peak picker.

/// Select the lower-middle element of `values`, reordering the slice.
///
/// Index `(n - 1) / 2` of the sorted order: the true median for odd lengths,
/// the lower of the two middle values for even lengths. Never averages.
/// Returns 0.0 for an empty slice.
pub fn lower_median(values: &mut [f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mid = (values.len() - 1) / 2;
    let (_, median, _) = values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
    *median
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_odd_length() {
        let mut v = [1.0, 5.0, 3.0];
        assert_eq!(lower_median(&mut v), 3.0);
    }

    #[test]
    fn test_even_length_picks_lower() {
        let mut v = [1.0, 5.0, 3.0, 7.0];
        assert_eq!(lower_median(&mut v), 3.0);
    }

    #[test]
    fn test_empty_and_single() {
        assert_eq!(lower_median(&mut []), 0.0);
        assert_eq!(lower_median(&mut [42.0]), 42.0);
    }
}
