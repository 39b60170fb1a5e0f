//! Biologically effective dose under the repair/damage model
//!
//! For a total dose `D` delivered in `n` equal fractions:
//!
//! ```text
//! BED = D / (1 - r) - n r / (s (1 - r)) * (1 - exp(-s D / n))
//! ```
//!
//! With `x = s D / n` this is evaluated as
//!
//! ```text
//! BED = D + n r / (s (1 - r)) * (x - (1 - exp(-x)))
//! ```
//!
//! which keeps its digits when `x` is small. As `s -> 0` the excess is `O(s)` and BED
//! collapses to `D`; this limit is taken explicitly below the `s` tolerance. As `r -> 1` BED diverges and
//! [DomainError::Singular] is returned instead.

use crate::error::{ensure_finite, ensure_positive, DomainError};
use crate::model::config::ModelConfig;
use crate::model::types::{BedResult, RdParams, Schedule};
use crate::routines::math::{is_negligible, linear_excess};

/// Dose per fraction of the EQD2 reference schedule, Gy.
pub const EQD2_FRACTION_DOSE: f64 = 2.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct BedEngine {
    config: ModelConfig,
}

impl BedEngine {
    pub fn new(config: ModelConfig) -> Self {
        BedEngine { config }
    }

    /// BED of total dose `d` delivered in `n` equal fractions.
    ///
    /// `n` is only used as a divisor here and need not be an integer.
    pub fn bed(&self, d: f64, n: f64, r: f64, s: f64) -> Result<f64, DomainError> {
        ensure_positive("total dose", d)?;
        ensure_positive("fractions", n)?;
        ensure_finite("r", r)?;
        ensure_finite("s", s)?;
        self.config.sign_policy.check_s(s)?;
        let one_r = self.config.one_minus_r(r)?;

        if is_negligible(s, self.config.tolerances.s) {
            return Ok(d);
        }

        let bed = d + (n * r) / (s * one_r) * linear_excess(s * d / n);
        if !bed.is_finite() {
            return Err(DomainError::Overflow {
                context: "evaluating the BED integral",
            });
        }
        Ok(bed)
    }

    /// BED of a single 2 Gy fraction, the normalization constant for EQD2.
    ///
    /// ```text
    /// 2 / (1 - r) - r / (s (1 - r)) * (1 - exp(-2 s))
    /// ```
    pub fn denom_bed_per_fraction_2gy(&self, r: f64, s: f64) -> Result<f64, DomainError> {
        self.bed(EQD2_FRACTION_DOSE, 1.0, r, s)
    }

    /// BED of a schedule together with its EQD2 normalization.
    pub fn evaluate(&self, schedule: &Schedule, rd: &RdParams) -> Result<BedResult, DomainError> {
        let bed = self.bed(
            schedule.total_dose(),
            schedule.fractions() as f64,
            rd.r,
            rd.s,
        )?;
        let per_fraction_2gy_denominator = self.denom_bed_per_fraction_2gy(rd.r, rd.s)?;
        Ok(BedResult {
            bed,
            per_fraction_2gy_denominator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_limit_is_exact() {
        let engine = BedEngine::default();
        assert_eq!(engine.bed(60.0, 30.0, 0.6, 0.0).unwrap(), 60.0);
        assert_eq!(engine.denom_bed_per_fraction_2gy(0.6, 0.0).unwrap(), 2.0);
    }

    #[test]
    fn test_reference_value() {
        let engine = BedEngine::default();
        let bed = engine.bed(60.0, 30.0, 0.6, 0.15).unwrap();
        assert!((bed - 72.24546620451537).abs() < 1e-9);
    }

    #[test]
    fn test_fractional_n_is_accepted() {
        let engine = BedEngine::default();
        assert!(engine.bed(10.0, 2.5, 0.5, 0.2).is_ok());
    }

    #[test]
    fn test_invalid_inputs() {
        let engine = BedEngine::default();
        assert!(engine.bed(0.0, 3.0, 0.5, 0.2).is_err());
        assert!(engine.bed(10.0, 0.0, 0.5, 0.2).is_err());
        assert!(engine.bed(10.0, 3.0, f64::NAN, 0.2).is_err());
        assert!(matches!(
            engine.bed(10.0, 3.0, 0.5, -0.2),
            Err(DomainError::InvalidParameter { name: "s", .. })
        ));
    }

    #[test]
    fn test_overflow_with_large_negative_s() {
        let engine = BedEngine::new(ModelConfig::permissive());
        assert!(matches!(
            engine.bed(1000.0, 1.0, 0.5, -5.0),
            Err(DomainError::Overflow { .. })
        ));
    }
}
