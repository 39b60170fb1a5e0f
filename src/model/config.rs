use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::routines::lambert::LambertW0Solver;

/// Whether a negative sensitization rate `s` is accepted.
///
/// Negative `s` (and the matching negative `Dq`) describes repair-deficient or
/// hyper-resistant phenotypes. It may equally be a data-entry artifact, so it has to
/// be switched on explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignPolicy {
    /// `s >= 0` is enforced
    #[default]
    Strict,
    /// Any finite `s` is accepted
    Permissive,
}

impl SignPolicy {
    pub(crate) fn check_s(&self, s: f64) -> Result<f64, DomainError> {
        match self {
            SignPolicy::Strict if s < 0.0 => Err(DomainError::InvalidParameter {
                name: "s",
                value: s,
                reason: "negative sensitization rate requires the permissive sign policy",
            }),
            _ => Ok(s),
        }
    }
}

/// Constant pair linking the shoulder form `{alpha/beta, Dq}` to `{r, s}`.
///
/// With `s = r / Dq` the two maps are
///
/// ```text
/// r         = m (sqrt(Dq^2 + c Dq alpha/beta) - Dq) / (alpha/beta)
/// alpha/beta = c' (1 - r) / (r s)
/// ```
///
/// They are exact inverses if and only if `c c' = 4` and `m = c' / 2`, so the
/// convention is fully determined by the discriminant coefficient `c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShoulderConvention {
    /// `c = 1`, `c' = 4`, `m = 2`
    #[default]
    Unit,
    /// `c = 2`, `c' = 2`, `m = 1`
    Double,
}

impl ShoulderConvention {
    /// `c`, the coefficient of `Dq alpha/beta` under the square root.
    pub fn discriminant_coefficient(&self) -> f64 {
        match self {
            ShoulderConvention::Unit => 1.0,
            ShoulderConvention::Double => 2.0,
        }
    }

    /// `c'`, the coefficient of the inverse map `alpha/beta = c' (1 - r) / (r s)`.
    pub fn alpha_beta_coefficient(&self) -> f64 {
        4.0 / self.discriminant_coefficient()
    }

    /// `m`, the factor in front of the root of the forward map.
    pub fn root_scale(&self) -> f64 {
        self.alpha_beta_coefficient() / 2.0
    }
}

/// Numeric thresholds shared by the translator, the BED integral and the inverter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    /// `1 - r` at or below this is a BED singularity
    #[serde(default = "default_one_minus_r")]
    pub one_minus_r: f64,
    /// `|s|` below this takes the linear (s = 0) branch
    #[serde(default = "default_tight")]
    pub s: f64,
    /// `|r|` below this makes `s` undefined when beta > 0
    #[serde(default = "default_tight")]
    pub r: f64,
    /// `|beta|` at or below this gives `s = 0` exactly
    #[serde(default = "default_tight")]
    pub beta: f64,
    /// `|alpha/beta|`, `|Dq|`, `|k|` and `|D0|` below this are division by zero
    #[serde(default = "default_tight")]
    pub divisor: f64,
    /// Denominator of the hypofractionation ratio
    #[serde(default = "default_ratio_denominator")]
    pub ratio_denominator: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Tolerances {
            one_minus_r: default_one_minus_r(),
            s: default_tight(),
            r: default_tight(),
            beta: default_tight(),
            divisor: default_tight(),
            ratio_denominator: default_ratio_denominator(),
        }
    }
}

/// Model-wide configuration handed to every engine component.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub sign_policy: SignPolicy,
    #[serde(default)]
    pub convention: ShoulderConvention,
    #[serde(default)]
    pub tolerances: Tolerances,
    #[serde(default)]
    pub solver: LambertW0Solver,
}

impl ModelConfig {
    pub fn permissive() -> Self {
        ModelConfig {
            sign_policy: SignPolicy::Permissive,
            ..Default::default()
        }
    }

    pub fn with_convention(mut self, convention: ShoulderConvention) -> Self {
        self.convention = convention;
        self
    }

    pub fn with_sign_policy(mut self, sign_policy: SignPolicy) -> Self {
        self.sign_policy = sign_policy;
        self
    }

    /// Validate `r < 1` with `1 - r` above tolerance and return `1 - r`.
    pub(crate) fn one_minus_r(&self, r: f64) -> Result<f64, DomainError> {
        let one_r = 1.0 - r;
        if one_r <= self.tolerances.one_minus_r {
            return Err(DomainError::Singular {
                reason: "r is too close to (or above) 1, BED diverges",
            });
        }
        Ok(one_r)
    }
}

// *********************************
// Default values for deserializing
// *********************************
fn default_one_minus_r() -> f64 {
    1e-9
}

fn default_tight() -> f64 {
    1e-12
}

fn default_ratio_denominator() -> f64 {
    1e-12
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conventions_are_self_consistent() {
        for convention in [ShoulderConvention::Unit, ShoulderConvention::Double] {
            let c = convention.discriminant_coefficient();
            let c_prime = convention.alpha_beta_coefficient();
            assert_eq!(c * c_prime, 4.0);
            assert_eq!(convention.root_scale(), c_prime / 2.0);
        }
    }

    #[test]
    fn test_unit_convention_constants() {
        let unit = ShoulderConvention::Unit;
        assert_eq!(unit.discriminant_coefficient(), 1.0);
        assert_eq!(unit.alpha_beta_coefficient(), 4.0);
        assert_eq!(unit.root_scale(), 2.0);
    }

    #[test]
    fn test_strict_policy_rejects_negative_s() {
        assert!(SignPolicy::Strict.check_s(-0.1).is_err());
        assert!(SignPolicy::Strict.check_s(0.0).is_ok());
        assert!(SignPolicy::Permissive.check_s(-0.1).is_ok());
    }

    #[test]
    fn test_one_minus_r_singularity() {
        let config = ModelConfig::default();
        assert!(config.one_minus_r(0.5).is_ok());
        assert!(matches!(
            config.one_minus_r(0.9999999995),
            Err(DomainError::Singular { .. })
        ));
        assert!(config.one_minus_r(1.5).is_err());
    }
}
