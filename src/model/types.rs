//! Core value types of the dose-equivalence engine

use serde::{Deserialize, Serialize};

use crate::error::{ensure_positive, DomainError};

/// Classical description of a cell-survival curve
///
/// Exactly one representation is active at a time; both describe the same curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum ClassicalParams {
    /// Linear-quadratic coefficients with the terminal slope dose
    LinearQuadratic {
        /// Gy⁻¹
        alpha: f64,
        /// Gy⁻²
        beta: f64,
        /// Gy
        d0: f64,
    },
    /// Clinical shoulder form
    Shoulder {
        /// Gy
        #[serde(alias = "alpha_by_beta")]
        alpha_beta: f64,
        /// Quasi-threshold dose, Gy
        #[serde(alias = "D_q", alias = "d_q")]
        dq: f64,
    },
}

impl ClassicalParams {
    pub fn linear_quadratic(alpha: f64, beta: f64, d0: f64) -> Self {
        ClassicalParams::LinearQuadratic { alpha, beta, d0 }
    }

    pub fn shoulder(alpha_beta: f64, dq: f64) -> Self {
        ClassicalParams::Shoulder { alpha_beta, dq }
    }

    /// α/β of the curve, whichever form is active.
    pub fn alpha_beta(&self, divisor_tolerance: f64) -> Result<f64, DomainError> {
        match *self {
            ClassicalParams::Shoulder { alpha_beta, .. } => Ok(alpha_beta),
            ClassicalParams::LinearQuadratic { alpha, beta, .. } => {
                if beta.abs() < divisor_tolerance {
                    return Err(DomainError::ZeroDivision { quantity: "beta" });
                }
                Ok(alpha / beta)
            }
        }
    }
}

/// Reduced repair/damage parameters
///
/// - `r`: residual (resistance) fraction, dimensionless, `r < 1`
/// - `s`: sensitization rate, Gy⁻¹
/// - `k`: overall scale, Gy⁻¹, only known when derived from `{alpha, beta, D0}`.
///   It cancels in every ratio-based formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RdParams {
    pub r: f64,
    pub s: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<f64>,
}

impl RdParams {
    pub fn new(r: f64, s: f64) -> Self {
        RdParams { r, s, k: None }
    }

    pub fn with_scale(r: f64, s: f64, k: f64) -> Self {
        RdParams { r, s, k: Some(k) }
    }
}

/// A fractionated treatment: total dose delivered in equal fractions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Schedule {
    total_dose: f64,
    fractions: u32,
}

impl Schedule {
    /// Create a schedule, rejecting `total_dose <= 0` and `fractions == 0`.
    pub fn new(total_dose: f64, fractions: u32) -> Result<Self, DomainError> {
        ensure_positive("total dose", total_dose)?;
        if fractions == 0 {
            return Err(DomainError::InvalidParameter {
                name: "fractions",
                value: 0.0,
                reason: "must be a positive integer",
            });
        }
        Ok(Schedule {
            total_dose,
            fractions,
        })
    }

    pub fn total_dose(&self) -> f64 {
        self.total_dose
    }

    pub fn fractions(&self) -> u32 {
        self.fractions
    }

    pub fn dose_per_fraction(&self) -> f64 {
        self.total_dose / self.fractions as f64
    }
}

/// Biologically effective dose of a schedule together with its 2-Gy normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BedResult {
    /// Gy
    pub bed: f64,
    /// BED of a single 2 Gy fraction
    pub per_fraction_2gy_denominator: f64,
}

/// Denominators at or below this do not define an EQD2.
const EQD2_DENOMINATOR_FLOOR: f64 = 1e-9;

impl BedResult {
    /// Number of 2 Gy fractions with the same BED.
    pub fn eqd2_fractions(&self) -> Option<f64> {
        let denom = self.per_fraction_2gy_denominator;
        if denom.is_finite() && denom > EQD2_DENOMINATOR_FLOOR {
            Some(self.bed / denom)
        } else {
            None
        }
    }

    /// Total dose delivered in 2 Gy fractions with the same BED (EQD2).
    pub fn eqd2_total(&self) -> Option<f64> {
        self.eqd2_fractions().map(|n| 2.0 * n)
    }
}

/// Outcome of an isoeffective conversion
///
/// `intermediate_k` and `lambert_w_value` are diagnostics of the Lambert W path.
/// They are `None` when the linear (s = 0) branch bypassed it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsoeffectResult {
    pub reference_bed: f64,
    pub new_fractions: u32,
    pub new_total_dose: f64,
    pub new_per_fraction: f64,
    pub intermediate_k: Option<f64>,
    pub lambert_w_value: Option<f64>,
}

/// Fractionation recommendation from the tumor/normal tissue comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Hypofractionation,
    Conventional,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recommendation::Hypofractionation => write!(f, "Hypofractionation is preferable"),
            Recommendation::Conventional => write!(f, "Conventional fractionation is preferable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_validation() {
        assert!(Schedule::new(60.0, 30).is_ok());
        assert!(Schedule::new(0.0, 30).is_err());
        assert!(Schedule::new(-2.0, 30).is_err());
        assert!(Schedule::new(60.0, 0).is_err());
        assert!(Schedule::new(f64::NAN, 3).is_err());
    }

    #[test]
    fn test_dose_per_fraction() {
        let schedule = Schedule::new(54.0, 3).unwrap();
        assert_eq!(schedule.dose_per_fraction(), 18.0);
    }

    #[test]
    fn test_eqd2_requires_positive_denominator() {
        let result = BedResult {
            bed: 10.0,
            per_fraction_2gy_denominator: 0.0,
        };
        assert_eq!(result.eqd2_fractions(), None);
        assert_eq!(result.eqd2_total(), None);

        let result = BedResult {
            bed: 10.0,
            per_fraction_2gy_denominator: 2.0,
        };
        assert_eq!(result.eqd2_fractions(), Some(5.0));
        assert_eq!(result.eqd2_total(), Some(10.0));
    }

    #[test]
    fn test_classical_params_tagged_json() {
        let json = r#"{"form": "shoulder", "alpha_by_beta": 10.0, "D_q": 1.5}"#;
        let params: ClassicalParams = serde_json::from_str(json).unwrap();
        assert_eq!(params, ClassicalParams::shoulder(10.0, 1.5));
    }

    #[test]
    fn test_alpha_beta_from_linear_quadratic() {
        let params = ClassicalParams::linear_quadratic(0.3, 0.03, 1.5);
        assert!((params.alpha_beta(1e-12).unwrap() - 10.0).abs() < 1e-12);
        let params = ClassicalParams::linear_quadratic(0.3, 0.0, 1.5);
        assert!(matches!(
            params.alpha_beta(1e-12),
            Err(DomainError::ZeroDivision { .. })
        ));
    }
}
