//! Tumor versus normal tissue comparison
//!
//! Hypofractionation is favoured when the tumor is at least as sensitive to large
//! fractions as the dose-limiting normal tissue:
//!
//! ```text
//! ratio = [alpha/beta_T (1 - r_T)] / [alpha/beta_N (1 - r_N)]
//! ratio <= 1  => Hypofractionation
//! ratio >  1  => Conventional
//! ```
//!
//! For shoulder-form input `alpha/beta (1 - r)` equals `c' (1 - r)^2 / (r s)` after the
//! round trip through `{r, s}`, so both published variants of the ratio agree.

use serde::Serialize;

use crate::error::DomainError;
use crate::model::config::ModelConfig;
use crate::model::translate::ParameterTranslator;
use crate::model::types::{ClassicalParams, Recommendation};

/// Ratios up to and including this value recommend hypofractionation.
pub const RATIO_THRESHOLD: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HypofractionationAssessment {
    pub r_tumor: f64,
    pub r_normal: f64,
    pub ratio: f64,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HypofractionationComparator {
    config: ModelConfig,
    translator: ParameterTranslator,
}

impl HypofractionationComparator {
    pub fn new(config: ModelConfig) -> Self {
        HypofractionationComparator {
            config,
            translator: ParameterTranslator::new(config),
        }
    }

    pub fn evaluate(
        &self,
        tumor: ClassicalParams,
        normal: ClassicalParams,
    ) -> Result<Recommendation, DomainError> {
        self.assess(tumor, normal)
            .map(|assessment| assessment.recommendation)
    }

    /// Compute the ratio together with the residual fractions it was built from.
    pub fn assess(
        &self,
        tumor: ClassicalParams,
        normal: ClassicalParams,
    ) -> Result<HypofractionationAssessment, DomainError> {
        let divisor = self.config.tolerances.divisor;
        let (ab_tumor, r_tumor) = self.sensitivity(tumor, divisor)?;
        let (ab_normal, r_normal) = self.sensitivity(normal, divisor)?;

        let numerator = ab_tumor * (1.0 - r_tumor);
        let denominator = ab_normal * (1.0 - r_normal);
        if denominator.abs() < self.config.tolerances.ratio_denominator {
            return Err(DomainError::ZeroDivision {
                quantity: "normal tissue alpha/beta (1 - r)",
            });
        }
        let ratio = numerator / denominator;
        if !ratio.is_finite() {
            return Err(DomainError::Overflow {
                context: "computing the tumor/normal ratio",
            });
        }

        let recommendation = if ratio <= RATIO_THRESHOLD {
            Recommendation::Hypofractionation
        } else {
            Recommendation::Conventional
        };
        Ok(HypofractionationAssessment {
            r_tumor,
            r_normal,
            ratio,
            recommendation,
        })
    }

    fn sensitivity(
        &self,
        params: ClassicalParams,
        divisor: f64,
    ) -> Result<(f64, f64), DomainError> {
        let alpha_beta = params.alpha_beta(divisor)?;
        let rd = self.translator.classical_to_rd(params)?;
        Ok((alpha_beta, rd.r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_input_is_exactly_one() {
        let comparator = HypofractionationComparator::default();
        let tissue = ClassicalParams::shoulder(10.0, 1.5);
        let assessment = comparator.assess(tissue, tissue).unwrap();
        assert_eq!(assessment.ratio, 1.0);
        assert_eq!(
            assessment.recommendation,
            Recommendation::Hypofractionation
        );
    }

    #[test]
    fn test_low_alpha_beta_tumor_favours_hypofractionation() {
        let comparator = HypofractionationComparator::default();
        let prostate = ClassicalParams::shoulder(1.5, 1.0);
        let rectum = ClassicalParams::shoulder(10.0, 1.0);
        assert_eq!(
            comparator.evaluate(prostate, rectum).unwrap(),
            Recommendation::Hypofractionation
        );
        assert_eq!(
            comparator.evaluate(rectum, prostate).unwrap(),
            Recommendation::Conventional
        );
    }

    #[test]
    fn test_rs_only_form_agrees() {
        let config = ModelConfig::default();
        let comparator = HypofractionationComparator::new(config);
        let translator = ParameterTranslator::new(config);
        let c_prime = config.convention.alpha_beta_coefficient();
        let tumor = ClassicalParams::shoulder(3.0, 2.0);
        let normal = ClassicalParams::shoulder(8.0, 1.2);

        let rs_form = |params| {
            let rd = translator.classical_to_rd(params).unwrap();
            c_prime * (1.0 - rd.r).powi(2) / (rd.r * rd.s)
        };
        let expected = rs_form(tumor) / rs_form(normal);
        let ratio = comparator.assess(tumor, normal).unwrap().ratio;
        assert!((ratio - expected).abs() < 1e-10 * expected.abs());
    }

    #[test]
    fn test_zero_denominator() {
        let comparator = HypofractionationComparator::default();
        // r = 1 - alpha D0 = 1 for the normal tissue
        let tumor = ClassicalParams::linear_quadratic(0.3, 0.03, 1.5);
        let normal = ClassicalParams::linear_quadratic(0.0, 0.03, 1.5);
        assert!(matches!(
            comparator.evaluate(tumor, normal),
            Err(DomainError::ZeroDivision { .. })
        ));
    }

    #[test]
    fn test_translator_errors_propagate() {
        let comparator = HypofractionationComparator::default();
        let tumor = ClassicalParams::shoulder(0.0, 1.5);
        let normal = ClassicalParams::shoulder(10.0, 1.5);
        assert!(matches!(
            comparator.evaluate(tumor, normal),
            Err(DomainError::ZeroDivision { .. })
        ));
    }
}
