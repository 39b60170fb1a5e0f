//! Mathematical utility functions for numerical stability
//!
//! This module provides the guarded exponentials shared by the BED integral,
//! the isoeffective inversion and the Lambert W solver.

/// Largest argument for which `exp` is finite in `f64`.
pub const EXP_OVERFLOW_ARG: f64 = 709.0;

/// Below this argument `exp` underflows to (sub)normal zero.
pub const EXP_UNDERFLOW_ARG: f64 = -745.0;

/// Compute `exp(x)`, clamped to `0` or `+inf` outside the representable range.
///
/// Unlike a bare `f64::exp`, a `NaN` argument is never produced from a finite input,
/// and the saturation points are explicit so that callers can test for them.
///
/// # Example
/// ```ignore
/// assert_eq!(exp_safe(-1000.0), 0.0);
/// assert!(exp_safe(1000.0).is_infinite());
/// ```
#[inline]
pub fn exp_safe(x: f64) -> f64 {
    if x > EXP_OVERFLOW_ARG {
        f64::INFINITY
    } else if x < EXP_UNDERFLOW_ARG {
        0.0
    } else {
        x.exp()
    }
}

/// Compute `1 - exp(-x)` without catastrophic cancellation for small `x`.
///
/// Uses the identity `1 - exp(-x) = -expm1(-x)`.
#[inline]
pub fn one_minus_exp_neg(x: f64) -> f64 {
    -(-x).exp_m1()
}

/// Below this magnitude [linear_excess] is summed from its Taylor series.
const LINEAR_EXCESS_SERIES: f64 = 0.1;

/// Compute `x - (1 - exp(-x))` without cancellation for small `x`.
///
/// Near zero both terms agree to leading order, so the series
/// `x^2/2 - x^3/6 + x^4/24 - ...` is summed instead.
#[inline]
pub fn linear_excess(x: f64) -> f64 {
    if x.abs() < LINEAR_EXCESS_SERIES {
        let mut term = x * x / 2.0;
        let mut sum = term;
        for k in 3..=16 {
            term *= -x / k as f64;
            sum += term;
        }
        sum
    } else {
        x + (-x).exp_m1()
    }
}

/// `true` when `|value| < eps`.
#[inline]
pub fn is_negligible(value: f64, eps: f64) -> bool {
    value.abs() < eps
}
