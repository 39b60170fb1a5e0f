//! Translation between classical survival-curve parameters and the reduced `{r, s, k}` set
//!
//! Two independent pairings are supported:
//!
//! ```text
//! Shoulder form {alpha/beta, Dq} <-> {r, s}
//!     r  = m (sqrt(Dq^2 + c Dq alpha/beta) - Dq) / (alpha/beta)
//!     s  = r / Dq
//!     Dq = r / s
//!     alpha/beta = c' (1 - r) / (r s)
//!
//! Linear-quadratic form {alpha, beta, D0} <-> {r, s, k}
//!     k = 1 / D0            D0    = 1 / k
//!     r = 1 - alpha D0      alpha = k (1 - r)
//!     s = 2 beta / (r k)    beta  = r s k / 2
//! ```
//!
//! The constants `c`, `c'` and `m` come from [ShoulderConvention]. Both pairings are
//! exact inverses wherever they are defined.

use crate::error::{ensure_finite, DomainError};
use crate::model::config::{ModelConfig, ShoulderConvention};
use crate::model::types::{ClassicalParams, RdParams};

#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterTranslator {
    config: ModelConfig,
}

impl ParameterTranslator {
    pub fn new(config: ModelConfig) -> Self {
        ParameterTranslator { config }
    }

    pub fn convention(&self) -> ShoulderConvention {
        self.config.convention
    }

    /// Map either classical form to RD parameters.
    ///
    /// The linear-quadratic form also yields the scale `k`; the shoulder form does not.
    pub fn classical_to_rd(&self, params: ClassicalParams) -> Result<RdParams, DomainError> {
        match params {
            ClassicalParams::Shoulder { alpha_beta, dq } => self.shoulder_to_rd(alpha_beta, dq),
            ClassicalParams::LinearQuadratic { alpha, beta, d0 } => {
                self.linear_quadratic_to_rd(alpha, beta, d0)
            }
        }
    }

    /// Map RD parameters back to the classical form they determine.
    ///
    /// With a known scale `k` the full `{alpha, beta, D0}` set is recovered, otherwise
    /// only the shoulder form.
    pub fn rd_to_classical(&self, params: RdParams) -> Result<ClassicalParams, DomainError> {
        match params.k {
            Some(k) => self.rd_to_linear_quadratic(params.r, params.s, k),
            None => self.rd_to_shoulder(params.r, params.s),
        }
    }

    /// Residual fraction `r` of the shoulder form, without deriving `s`.
    pub fn residual_fraction(&self, alpha_beta: f64, dq: f64) -> Result<f64, DomainError> {
        ensure_finite("alpha/beta", alpha_beta)?;
        ensure_finite("Dq", dq)?;
        let divisor = self.config.tolerances.divisor;
        if alpha_beta.abs() < divisor {
            return Err(DomainError::ZeroDivision {
                quantity: "alpha/beta",
            });
        }
        if dq.abs() < divisor {
            return Err(DomainError::ZeroDivision { quantity: "Dq" });
        }

        let convention = self.config.convention;
        let c = convention.discriminant_coefficient();
        let m = convention.root_scale();

        let discriminant = dq * dq + c * dq * alpha_beta;
        if discriminant < 0.0 {
            return Err(DomainError::ComplexRoot { discriminant });
        }
        let root = discriminant.sqrt();

        // sqrt(D) - Dq cancels when c Dq alpha/beta << Dq^2; rationalize for Dq > 0
        let r = if dq > 0.0 {
            m * c * dq / (root + dq)
        } else {
            m * (root - dq) / alpha_beta
        };
        Ok(r)
    }

    pub fn shoulder_to_rd(&self, alpha_beta: f64, dq: f64) -> Result<RdParams, DomainError> {
        let r = self.residual_fraction(alpha_beta, dq)?;
        let s = self.config.sign_policy.check_s(r / dq)?;
        Ok(RdParams::new(r, s))
    }

    pub fn rd_to_shoulder(&self, r: f64, s: f64) -> Result<ClassicalParams, DomainError> {
        ensure_finite("r", r)?;
        ensure_finite("s", s)?;
        self.config.sign_policy.check_s(s)?;
        let tolerances = self.config.tolerances;
        if s.abs() < tolerances.s {
            return Err(DomainError::ZeroDivision { quantity: "s" });
        }
        if r.abs() < tolerances.r {
            return Err(DomainError::ZeroDivision { quantity: "r" });
        }

        let c_prime = self.config.convention.alpha_beta_coefficient();
        Ok(ClassicalParams::Shoulder {
            alpha_beta: c_prime * (1.0 - r) / (r * s),
            dq: r / s,
        })
    }

    pub fn linear_quadratic_to_rd(
        &self,
        alpha: f64,
        beta: f64,
        d0: f64,
    ) -> Result<RdParams, DomainError> {
        ensure_finite("alpha", alpha)?;
        ensure_finite("beta", beta)?;
        ensure_finite("D0", d0)?;
        let tolerances = self.config.tolerances;
        if d0.abs() < tolerances.divisor {
            return Err(DomainError::ZeroDivision { quantity: "D0" });
        }
        if d0 < 0.0 {
            return Err(DomainError::InvalidParameter {
                name: "D0",
                value: d0,
                reason: "must be strictly positive",
            });
        }

        let k = 1.0 / d0;
        let r = 1.0 - alpha * d0;

        // beta -> 0 is the purely linear curve
        if beta.abs() <= tolerances.beta {
            return Ok(RdParams::with_scale(r, 0.0, k));
        }
        if r.abs() < tolerances.r {
            return Err(DomainError::Singular {
                reason: "r is zero while beta > 0, s is undefined",
            });
        }

        let s = 2.0 * beta / (r * k);
        if !s.is_finite() {
            return Err(DomainError::Overflow {
                context: "computing s = 2 beta / (r k)",
            });
        }
        let s = self.config.sign_policy.check_s(s)?;
        Ok(RdParams::with_scale(r, s, k))
    }

    pub fn rd_to_linear_quadratic(
        &self,
        r: f64,
        s: f64,
        k: f64,
    ) -> Result<ClassicalParams, DomainError> {
        ensure_finite("r", r)?;
        ensure_finite("s", s)?;
        ensure_finite("k", k)?;
        self.config.sign_policy.check_s(s)?;
        if k.abs() < self.config.tolerances.divisor {
            return Err(DomainError::ZeroDivision { quantity: "k" });
        }
        if k < 0.0 {
            return Err(DomainError::InvalidParameter {
                name: "k",
                value: k,
                reason: "must be strictly positive",
            });
        }

        Ok(ClassicalParams::LinearQuadratic {
            alpha: k * (1.0 - r),
            beta: r * s * k / 2.0,
            d0: 1.0 / k,
        })
    }
}
