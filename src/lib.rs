//! Isoeffective dose conversion under the repair/damage (RD) cell-survival model
//!
//! The RD model describes a survival curve by a residual fraction `r` and a
//! sensitization rate `s` (plus an optional scale `k`). This crate translates classical
//! parameters into that form, evaluates the biologically effective dose (BED) of a
//! fractionated schedule, inverts it for a different number of fractions through the
//! principal branch of the Lambert W function, and compares tumor and normal tissue to
//! recommend a fractionation strategy.
//!
//! ```rust
//! use rdbed::prelude::*;
//!
//! # fn main() -> Result<(), DomainError> {
//! let rd = classical_to_rd(ClassicalParams::shoulder(10.0, 1.5))?;
//! let reference_bed = bed(54.0, 3.0, rd.r, rd.s)?;
//! let dose_in_five = invert_isoeffective_dose(reference_bed, rd.r, rd.s, 5)?;
//! assert!(dose_in_five > 54.0);
//! # Ok(())
//! # }
//! ```
//!
//! The free functions use [ModelConfig::default]. Construct the engines with an explicit
//! [ModelConfig] to change the sign policy, shoulder convention or tolerances.

/// Entrypoints for evaluating a configuration file
pub mod entrypoints;
/// Typed failures of the numerical core
pub mod error;
/// Tumor versus normal tissue recommendation
pub mod hypofractionation;
/// Isoeffective dose inversion
pub mod isoeffect;
/// Model parameters, configuration and the BED integral
pub mod model;
/// Published parameter sets
pub mod presets;
/// Supporting routines: solver, logging, output and settings
pub mod routines;

pub use error::DomainError;
pub use model::config::ModelConfig;
pub use model::types::{ClassicalParams, RdParams, Recommendation};

pub mod prelude {
    pub use crate::entrypoints;
    pub use crate::error::DomainError;
    pub use crate::hypofractionation::{HypofractionationAssessment, HypofractionationComparator};
    pub use crate::isoeffect::table::{IsoeffectRow, IsoeffectTable};
    pub use crate::isoeffect::IsoeffectiveDoseInverter;
    pub use crate::model::{
        BedEngine, BedResult, ClassicalParams, IsoeffectResult, ModelConfig, ParameterTranslator,
        RdParams, Recommendation, Schedule, ShoulderConvention, SignPolicy, Tolerances,
    };
    pub use crate::presets::{Preset, PresetCatalog, PresetParams};
    pub use crate::routines::lambert::LambertW0Solver;
    pub use crate::routines::settings::Settings;
    pub use crate::{
        bed, classical_to_rd, evaluate_hypofractionation, invert_isoeffective_dose, lambert_w0,
        rd_to_classical,
    };
}

/// Principal branch of the Lambert W function.
pub fn lambert_w0(z: f64) -> Result<f64, DomainError> {
    routines::lambert::lambert_w0(z)
}

pub fn classical_to_rd(params: ClassicalParams) -> Result<RdParams, DomainError> {
    model::ParameterTranslator::default().classical_to_rd(params)
}

pub fn rd_to_classical(params: RdParams) -> Result<ClassicalParams, DomainError> {
    model::ParameterTranslator::default().rd_to_classical(params)
}

/// BED of total dose `d` delivered in `n` fractions.
pub fn bed(d: f64, n: f64, r: f64, s: f64) -> Result<f64, DomainError> {
    model::BedEngine::default().bed(d, n, r, s)
}

/// Total dose in `n2` fractions reproducing `reference_bed`.
pub fn invert_isoeffective_dose(
    reference_bed: f64,
    r: f64,
    s: f64,
    n2: u32,
) -> Result<f64, DomainError> {
    isoeffect::IsoeffectiveDoseInverter::default().invert(reference_bed, r, s, n2)
}

pub fn evaluate_hypofractionation(
    tumor: ClassicalParams,
    normal: ClassicalParams,
) -> Result<Recommendation, DomainError> {
    hypofractionation::HypofractionationComparator::default().evaluate(tumor, normal)
}
