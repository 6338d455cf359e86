use crate::io::configuration::EPSILON;

/// Equality within the solver's absolute tolerance
pub fn is_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// `a` is smaller than `b` by more than the tolerance
pub fn definitely_less(a: f64, b: f64) -> bool {
    a < b - EPSILON
}

/// Index of the tolerance-wide band holding `value`
///
/// Values in one band are within tolerance of each other and bands order the
/// same way as the values, so ranking by band is transitive.
pub fn tolerance_band(value: f64) -> f64 {
    (value / EPSILON).floor()
}

/// Residual counts as satisfied
///
/// Feasibility is exact: a residual must not exceed zero.
pub fn is_satisfied(residual: f64) -> bool {
    residual <= 0.0
}

/// Sum of squared positive residuals
///
/// Zero iff every residual is satisfied.
pub fn violation_penalty<'a>(residuals: impl IntoIterator<Item = &'a f64>) -> f64 {
    residuals
        .into_iter()
        .filter(|residual| !is_satisfied(**residual))
        .map(|residual| residual * residual)
        .sum()
}
