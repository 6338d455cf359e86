//! Tests for tolerance-based comparisons and violation penalties

#[cfg(test)]
mod tests {
    use tilesolve::io::configuration::EPSILON;
    use tilesolve::math::float::{
        definitely_less, is_equal, is_satisfied, tolerance_band, violation_penalty,
    };

    // Tests values within the tolerance compare equal
    // Verified by using exact equality
    #[test]
    fn test_is_equal_within_tolerance() {
        assert!(is_equal(1.0, 1.0 + EPSILON / 2.0));
        assert!(!is_equal(1.0, 1.0 + EPSILON * 2.0));
    }

    // Tests strict ordering requires a margin beyond the tolerance
    // Verified by dropping the tolerance
    #[test]
    fn test_definitely_less() {
        assert!(definitely_less(1.0, 2.0));
        assert!(!definitely_less(1.0, 1.0 + EPSILON / 2.0));
        assert!(!definitely_less(2.0, 1.0));
    }

    // Tests feasibility is exact at zero
    // Verified by allowing residuals up to the tolerance
    #[test]
    fn test_is_satisfied_exact() {
        assert!(is_satisfied(0.0));
        assert!(is_satisfied(-5.0));
        assert!(!is_satisfied(EPSILON / 10.0));
    }

    // Tests penalty sums squares of violated residuals only
    // Verified by squaring satisfied residuals too
    #[test]
    fn test_violation_penalty() {
        let residuals = [-3.0, 2.0, 0.0, 1.0];
        assert!((violation_penalty(&residuals) - 5.0).abs() < f64::EPSILON);
        assert!(violation_penalty(&[-1.0, -2.0]).abs() < f64::EPSILON);
    }

    // Tests values a tolerance apart land in ordered bands
    // Verified by rounding to the nearest band
    #[test]
    fn test_tolerance_band() {
        assert!(tolerance_band(0.0).abs() < f64::EPSILON);
        assert!((tolerance_band(0.0009) - tolerance_band(0.0)).abs() < f64::EPSILON);
        assert!(tolerance_band(0.0015) > tolerance_band(0.0009));
        assert!(tolerance_band(-0.0005) < tolerance_band(0.0));
    }
}
