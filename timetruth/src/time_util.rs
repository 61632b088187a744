//! Small time-domain helpers shared by the estimators and the confidence
//! ladder (spec §8 testable properties).

use crate::constants::WEEK_MS;

/// True if `a` and `b` (both ms-of-week) are within `tolerance_ms` of each
/// other, accounting for the week wrap in both directions. Symmetric in
/// `(a, b)` (spec §8).
pub fn is_tow_ms_within_tolerance(a: i64, b: i64, tolerance_ms: i64) -> bool {
    let diff = (a - b).abs();
    let wrapped = WEEK_MS - diff;
    diff.min(wrapped) <= tolerance_ms
}

/// Splits a sorted sample count `n` into the index pairs to average for the
/// lower and upper quartiles (Tukey's hinges). Returns
/// `((lo_a, lo_b), (hi_a, hi_b))`; the two pairs are mirror images around
/// the middle and `lo_a + hi_b == lo_b + hi_a == n - 1` (spec §8).
///
/// `n == 0` is a caller error; there is no quartile of an empty pool.
pub fn get_quartile_indices(n: usize) -> ((usize, usize), (usize, usize)) {
    assert!(n > 0, "get_quartile_indices requires a non-empty pool");
    let last = (n - 1) as f64;
    let q1 = last / 4.0;
    let q3 = 3.0 * last / 4.0;
    let lower = (q1.floor() as usize, q1.ceil() as usize);
    let upper = (q3.floor() as usize, q3.ceil() as usize);
    (lower, upper)
}

/// Averages the two (possibly equal) samples at a quartile index pair.
pub fn quartile_value(sorted: &[i64], pair: (usize, usize)) -> f64 {
    (sorted[pair.0] as f64 + sorted[pair.1] as f64) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerance_is_symmetric() {
        assert_eq!(
            is_tow_ms_within_tolerance(100, 200, 50),
            is_tow_ms_within_tolerance(200, 100, 50)
        );
    }

    #[test]
    fn tolerance_handles_week_wrap() {
        let near_end = WEEK_MS - 100;
        let near_start = 100;
        assert!(is_tow_ms_within_tolerance(near_end, near_start, 300));
        assert!(!is_tow_ms_within_tolerance(near_end, near_start, 50));
    }

    #[test]
    fn quartile_indices_sum_to_n_minus_1() {
        for n in 1..=20usize {
            let (lower, upper) = get_quartile_indices(n);
            assert_eq!(lower.0 + upper.1, n - 1);
            assert_eq!(lower.1 + upper.0, n - 1);
        }
    }

    #[test]
    fn quartile_indices_mirror_around_middle() {
        for n in 1..=20usize {
            let (lower, upper) = get_quartile_indices(n);
            assert_eq!(upper, (n - 1 - lower.1, n - 1 - lower.0));
        }
    }

    #[test]
    fn odd_count_averages_centre_sample() {
        // n=5: last=4, q1=1.0 exactly -> lower pair collapses to a single index.
        let (lower, _upper) = get_quartile_indices(5);
        assert_eq!(lower, (1, 1));
    }
}
