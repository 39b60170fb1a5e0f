//! Principal branch of the Lambert W function
//!
//! `W0(z)` is the solution `w >= -1` of `w * exp(w) = z`, defined for `z >= -1/e`.
//!
//! The solver picks an initial guess per region and refines it with Halley's method.
//! Numerator and denominator of the Halley step are divided by `e^w`, so the update
//! only needs `exp(-w)` and stays finite up to `z = f64::MAX`:
//!
//! ```text
//! f(w)   = w e^w - z
//! f'(w)  = e^w (w + 1)
//! f''(w) = e^w (w + 2)
//!
//! g(w)   = f(w) / e^w = w - z e^-w
//! w <- w - g / ((w + 1) - (w + 2) g / (2 (w + 1)))
//! ```
//!
//! | Region                | Initial guess                              |
//! |-----------------------|--------------------------------------------|
//! | `z` near `-1/e`       | `-1 + p - p^2/3`, `p = sqrt(2 (e z + 1))`  |
//! | other `z < 0`         | `ln(1 + z)`, kept above `-1`               |
//! | `0 < z < 1`           | `z`                                        |
//! | `1 <= z < e`          | `ln(1 + z)`                                |
//! | `z >= e`              | `ln z - ln ln z`                           |

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// `-1/e`, the branch point of `W`.
pub const BRANCH_POINT: f64 = -0.36787944117144233;

/// Arguments this close to the branch point return exactly `-1`.
pub const BRANCH_TOLERANCE: f64 = 1e-12;

/// Arguments with a magnitude below this return exactly `0`.
pub const ZERO_TOLERANCE: f64 = 1e-16;

/// Below this argument the square-root expansion around the branch point is used.
const BRANCH_REGION: f64 = -0.25;

/// Distance from `-1` inside which the Halley denominator is treated as singular.
const SINGULAR_GAP: f64 = 1e-14;

/// Nudge applied to leave the `w = -1` singularity.
const SINGULAR_NUDGE: f64 = 1e-12;

/// Denominators smaller than this fall back to a Newton step.
const DENOMINATOR_FLOOR: f64 = 1e-18;

/// Scaled residual `|w - z e^-w|` treated as exact, relative to `1 + |w|`.
const RESIDUAL_FLOOR: f64 = 4.0 * f64::EPSILON;

/// Halley refinement for the principal branch `W0`.
///
/// The iteration count is bounded, so a call always terminates; failure to converge
/// is reported as [DomainError::NonConvergent] rather than returning the last iterate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LambertW0Solver {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Convergence threshold on `|dw| / (1 + |w|)`.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Largest allowed Halley/Newton step.
    #[serde(default = "default_max_step")]
    pub max_step: f64,
}

impl Default for LambertW0Solver {
    fn default() -> Self {
        LambertW0Solver {
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            max_step: default_max_step(),
        }
    }
}

impl LambertW0Solver {
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        LambertW0Solver {
            max_iterations,
            tolerance,
            ..Default::default()
        }
    }

    /// Solve `w e^w = z` on the principal branch.
    pub fn solve(&self, z: f64) -> Result<f64, DomainError> {
        if z.is_nan() {
            return Err(DomainError::InvalidParameter {
                name: "z",
                value: z,
                reason: "must be a finite number",
            });
        }
        if z == f64::INFINITY {
            return Err(DomainError::Overflow {
                context: "evaluating Lambert W at +inf",
            });
        }
        if z < BRANCH_POINT - BRANCH_TOLERANCE {
            return Err(DomainError::BelowBranchPoint { z });
        }
        if (z - BRANCH_POINT).abs() <= BRANCH_TOLERANCE {
            return Ok(-1.0);
        }
        if z.abs() < ZERO_TOLERANCE {
            return Ok(0.0);
        }

        let mut w = initial_guess(z);

        for _ in 0..self.max_iterations {
            let g = w - z * (-w).exp();
            let wp1 = w + 1.0;

            // Residual already at rounding level; near -1/e the step would only oscillate
            if g.abs() <= RESIDUAL_FLOOR * (1.0 + w.abs()) {
                return Ok(w.max(-1.0));
            }

            if wp1.abs() < SINGULAR_GAP {
                w = -1.0 + SINGULAR_NUDGE.copysign(wp1);
                continue;
            }

            let halley = wp1 - (w + 2.0) * g / (2.0 * wp1);
            let step = if halley.is_finite() && halley.abs() >= DENOMINATOR_FLOOR {
                g / halley
            } else {
                // Plain Newton step
                if wp1.abs() < DENOMINATOR_FLOOR {
                    return Err(DomainError::NonConvergent {
                        z,
                        iterations: self.max_iterations,
                    });
                }
                g / wp1
            };

            let step = step.clamp(-self.max_step, self.max_step);
            w -= step;

            if !w.is_finite() {
                return Err(DomainError::NonConvergent {
                    z,
                    iterations: self.max_iterations,
                });
            }
            if step.abs() <= self.tolerance * (1.0 + w.abs()) {
                // The principal branch never lies below -1
                return Ok(w.max(-1.0));
            }
        }

        Err(DomainError::NonConvergent {
            z,
            iterations: self.max_iterations,
        })
    }
}

fn initial_guess(z: f64) -> f64 {
    if z < BRANCH_REGION {
        let p = (2.0 * (std::f64::consts::E * z + 1.0)).max(0.0).sqrt();
        (-1.0 + p - p * p / 3.0).clamp(-1.0 + SINGULAR_NUDGE, -0.1)
    } else if z < 0.0 {
        z.ln_1p().max(-1.0 + 1e-9)
    } else if z < 1.0 {
        z
    } else if z < std::f64::consts::E {
        z.ln_1p()
    } else {
        let l1 = z.ln();
        l1 - l1.ln()
    }
}

/// Principal branch Lambert W with the default solver settings.
pub fn lambert_w0(z: f64) -> Result<f64, DomainError> {
    LambertW0Solver::default().solve(z)
}

// *********************************
// Default values for deserializing
// *********************************
fn default_max_iterations() -> usize {
    80
}

fn default_tolerance() -> f64 {
    1e-13
}

fn default_max_step() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn residual(z: f64) -> f64 {
        let w = lambert_w0(z).unwrap();
        (w * w.exp() - z).abs()
    }

    #[test]
    fn test_branch_point_constant() {
        assert!((BRANCH_POINT + (-1.0_f64).exp()).abs() < 1e-16);
    }

    #[test]
    fn test_zero() {
        assert_eq!(lambert_w0(0.0).unwrap(), 0.0);
        assert_eq!(lambert_w0(1e-17).unwrap(), 0.0);
    }

    #[test]
    fn test_branch_point_returns_minus_one() {
        assert_eq!(lambert_w0(-1.0 / std::f64::consts::E).unwrap(), -1.0);
        assert_eq!(lambert_w0(BRANCH_POINT + 5e-13).unwrap(), -1.0);
    }

    #[test]
    fn test_known_values() {
        assert!((lambert_w0(1.0).unwrap() - 0.5671432904097838).abs() < 1e-12);
        assert!((lambert_w0(std::f64::consts::E).unwrap() - 1.0).abs() < 1e-12);
        assert!((lambert_w0(10.0).unwrap() - 1.7455280027406992).abs() < 1e-12);
        assert!((lambert_w0(-0.2).unwrap() - (-0.2591711018190737)).abs() < 1e-12);
    }

    #[test]
    fn test_below_branch_point() {
        assert!(matches!(
            lambert_w0(-0.4),
            Err(DomainError::BelowBranchPoint { .. })
        ));
        assert!(matches!(
            lambert_w0(f64::NEG_INFINITY),
            Err(DomainError::BelowBranchPoint { .. })
        ));
    }

    #[test]
    fn test_non_finite_arguments() {
        assert!(matches!(
            lambert_w0(f64::INFINITY),
            Err(DomainError::Overflow { .. })
        ));
        assert!(lambert_w0(f64::NAN).is_err());
    }

    #[test]
    fn test_largest_finite_argument() {
        // Only exp(-w) is evaluated, so the top of the f64 range converges
        let z = f64::MAX;
        let w = lambert_w0(z).unwrap();
        assert!(w > 700.0 && w < 705.0);
        assert!((w + w.ln() - z.ln()).abs() < 1e-9);
    }

    #[test]
    fn test_residual_small_and_moderate() {
        let near_branch = BRANCH_POINT + 1e-10;
        for &z in &[near_branch, -0.3678, -0.36, -0.3, -0.1, -1e-6, 1e-6, 0.5, 2.0, 5.0, 100.0] {
            assert!(residual(z) < 1e-9, "residual too large at z = {}", z);
        }
    }

    #[test]
    fn test_large_arguments() {
        let w = lambert_w0(1e300).unwrap();
        assert!((w - 684.2472086297608).abs() < 1e-9);
        let w = lambert_w0(f64::MAX).unwrap();
        assert!((w - 703.2270331047702).abs() < 1e-9);
    }

    #[test]
    fn test_iteration_cap_is_reported() {
        let solver = LambertW0Solver::new(1, 1e-30);
        assert!(matches!(
            solver.solve(50.0),
            Err(DomainError::NonConvergent { iterations: 1, .. })
        ));
    }
}
