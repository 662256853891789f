//! Two-proportion z-test used to compare variant click-through rates.

/// Error function via the Abramowitz and Stegun 7.1.26 rational
/// approximation. Max absolute error about 1.5e-7.
#[must_use]
pub fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}

/// Standard normal cumulative distribution function.
#[must_use]
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Two-tailed confidence that two click proportions differ.
///
/// Pooled-proportion z-test between control (`clicks_c` of `n_c`) and a
/// variant (`clicks_v` of `n_v`). Returns `P(|Z| < z)` in `[0, 1)`. Zero
/// impressions on either side, or a degenerate pooled proportion (all or no
/// clicks everywhere), reports 0 rather than erroring.
#[must_use]
pub fn two_proportion_confidence(clicks_c: u64, n_c: u64, clicks_v: u64, n_v: u64) -> f64 {
    if n_c == 0 || n_v == 0 {
        return 0.0;
    }
    let n_c_f = n_c as f64;
    let n_v_f = n_v as f64;
    let p_c = clicks_c as f64 / n_c_f;
    let p_v = clicks_v as f64 / n_v_f;

    let pooled = (clicks_c + clicks_v) as f64 / (n_c_f + n_v_f);
    let se = (pooled * (1.0 - pooled) * (1.0 / n_c_f + 1.0 / n_v_f)).sqrt();
    if se == 0.0 || !se.is_finite() {
        return 0.0;
    }

    let z = (p_c - p_v).abs() / se;
    erf(z / std::f64::consts::SQRT_2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn erf_matches_reference_values() {
        assert!(close(erf(0.0), 0.0, 1e-12));
        assert!(close(erf(1.0), 0.842_700_79, 1e-6));
        assert!(close(erf(-1.0), -0.842_700_79, 1e-6));
        assert!(close(erf(2.0), 0.995_322_27, 1e-6));
    }

    #[test]
    fn normal_cdf_matches_reference_values() {
        assert!(close(normal_cdf(0.0), 0.5, 1e-12));
        assert!(close(normal_cdf(1.96), 0.975, 1e-4));
        assert!(close(normal_cdf(-1.96), 0.025, 1e-4));
    }

    #[test]
    fn zero_impressions_report_zero_confidence() {
        assert_eq!(two_proportion_confidence(0, 0, 5, 100), 0.0);
        assert_eq!(two_proportion_confidence(5, 100, 0, 0), 0.0);
    }

    #[test]
    fn degenerate_pooled_proportion_reports_zero() {
        // No clicks anywhere: se is 0.
        assert_eq!(two_proportion_confidence(0, 100, 0, 100), 0.0);
        // Every impression clicked on both sides.
        assert_eq!(two_proportion_confidence(100, 100, 50, 50), 0.0);
    }

    #[test]
    fn identical_proportions_are_not_significant() {
        let conf = two_proportion_confidence(50, 1000, 50, 1000);
        assert!(close(conf, 0.0, 1e-9));
    }

    #[test]
    fn large_difference_is_highly_significant() {
        let conf = two_proportion_confidence(100, 1000, 200, 1000);
        assert!(conf > 0.99);
    }

    #[test]
    fn small_difference_stays_below_threshold() {
        let conf = two_proportion_confidence(50, 1000, 65, 1000);
        assert!(conf > 0.5 && conf < 0.95);
    }
}
