//! Error taxonomy of the dose-equivalence engine
//!
//! Every numerical routine in the crate returns a [DomainError] instead of panicking
//! or handing back a `NaN`. Lower-level failures travel unchanged through the
//! composing functions, with one exception: a Lambert-W failure raised while
//! inverting a BED is wrapped in [DomainError::NoPhysicalSolution] so the caller can
//! tell "the schedule has no isoeffective counterpart" apart from a direct solver call.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("argument {z} lies below the Lambert W branch point -1/e")]
    BelowBranchPoint { z: f64 },

    #[error("Lambert W iteration did not converge for z = {z} after {iterations} iterations")]
    NonConvergent { z: f64, iterations: usize },

    #[error("numeric overflow while {context}")]
    Overflow { context: &'static str },

    #[error("complex root: discriminant {discriminant} is negative (Dq and alpha/beta mismatch)")]
    ComplexRoot { discriminant: f64 },

    #[error("division by zero: {quantity} is too close to zero")]
    ZeroDivision { quantity: &'static str },

    #[error("singular model: {reason}")]
    Singular { reason: &'static str },

    #[error("computed dose {dose} is non-physical")]
    NonPhysicalResult { dose: f64 },

    #[error("no physical isoeffective solution: {0}")]
    NoPhysicalSolution(#[source] Box<DomainError>),

    #[error("invalid {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

impl DomainError {
    /// Short, stable identifier of the error kind, kept alongside messages in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::BelowBranchPoint { .. } => "below_branch_point",
            DomainError::NonConvergent { .. } => "non_convergent",
            DomainError::Overflow { .. } => "overflow",
            DomainError::ComplexRoot { .. } => "complex_root",
            DomainError::ZeroDivision { .. } => "zero_division",
            DomainError::Singular { .. } => "singular",
            DomainError::NonPhysicalResult { .. } => "non_physical_result",
            DomainError::NoPhysicalSolution(_) => "no_physical_solution",
            DomainError::InvalidParameter { .. } => "invalid_parameter",
        }
    }
}

/// Reject non-finite inputs before they reach any formula.
pub(crate) fn ensure_finite(name: &'static str, value: f64) -> Result<f64, DomainError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DomainError::InvalidParameter {
            name,
            value,
            reason: "must be a finite number",
        })
    }
}

/// Reject non-finite or non-positive inputs.
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<f64, DomainError> {
    ensure_finite(name, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(DomainError::InvalidParameter {
            name,
            value,
            reason: "must be strictly positive",
        })
    }
}
