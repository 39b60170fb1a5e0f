//! Parameterizations of the repair/damage survival model and the BED integral

pub mod bed;
pub mod config;
pub mod translate;
pub mod types;

pub use bed::BedEngine;
pub use config::{ModelConfig, ShoulderConvention, SignPolicy, Tolerances};
pub use translate::ParameterTranslator;
pub use types::{
    BedResult, ClassicalParams, IsoeffectResult, RdParams, Recommendation, Schedule,
};
