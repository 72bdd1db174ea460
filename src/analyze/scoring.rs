//! Per-comment quality score: the mean of the applicable metric ratings.
//!
//! A rating of -1 marks a metric as not applicable and is excluded from the
//! mean. Inputs arrive already range-checked by the classifier parse layer,
//! so no clamping happens here.

use super::MetricVector;

/// Reduce one metric vector to a single 0–5 score.
///
/// Returns 0.0 when every entry is -1 (nothing applicable). Pure and
/// infallible: garbage in degrades to 0.0, never an error.
pub fn compute_score(metrics: &MetricVector) -> f64 {
    let mut sum = 0i64;
    let mut n = 0u32;
    for &m in metrics {
        if m != -1 {
            sum += i64::from(m);
            n += 1;
        }
    }
    if n == 0 {
        0.0
    } else {
        sum as f64 / f64::from(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_skips_not_applicable_entries() {
        assert_eq!(compute_score(&[4, -1, 5, 3, 4]), 4.0);
    }

    #[test]
    fn all_not_applicable_degrades_to_zero() {
        assert_eq!(compute_score(&[-1, -1, -1, -1, -1]), 0.0);
    }

    #[test]
    fn full_vector_is_plain_mean() {
        assert!((compute_score(&[5, 4, 3, 2, 1]) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn single_applicable_entry() {
        assert_eq!(compute_score(&[-1, -1, 2, -1, -1]), 2.0);
    }

    #[test]
    fn zero_ratings_count_as_applicable() {
        assert_eq!(compute_score(&[0, 0, -1, -1, -1]), 0.0);
    }
}
