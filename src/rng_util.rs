/// Generate a random `f64` in the range `[low, high)`.
#[inline]
pub(crate) fn f64_range(rng: &mut fastrand::Rng, low: f64, high: f64) -> f64 {
    low + rng.f64() * (high - low)
}

/// Generate a random `f64` in `[low, high]`, uniform in log space.
///
/// Callers guarantee `low > 0`.
#[inline]
pub(crate) fn log_f64_range(rng: &mut fastrand::Rng, low: f64, high: f64) -> f64 {
    f64_range(rng, low.ln(), high.ln()).exp().clamp(low, high)
}

/// Generate a random `i64` in `[low, high]`, uniform in log space then rounded.
///
/// Callers guarantee `low >= 1`.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub(crate) fn log_i64_range(rng: &mut fastrand::Rng, low: i64, high: i64) -> i64 {
    let raw = f64_range(rng, (low as f64).ln(), (high as f64).ln()).exp().round() as i64;
    // Rounding can step just past either bound
    raw.clamp(low, high)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_stay_in_bounds() {
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..500 {
            let x = f64_range(&mut rng, -1.0, 1.0);
            assert!((-1.0..1.0).contains(&x));
            let y = log_f64_range(&mut rng, 1e-4, 1.0);
            assert!((1e-4..=1.0).contains(&y));
            let n = log_i64_range(&mut rng, 1, 1000);
            assert!((1..=1000).contains(&n));
        }
    }

    #[test]
    fn degenerate_range() {
        let mut rng = fastrand::Rng::with_seed(7);
        assert_eq!(log_i64_range(&mut rng, 5, 5), 5);
        assert!((f64_range(&mut rng, 2.0, 2.0) - 2.0).abs() < f64::EPSILON);
    }
}
