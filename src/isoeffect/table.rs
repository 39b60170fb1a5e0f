use rayon::prelude::*;
use serde::Serialize;

use crate::error::DomainError;
use crate::isoeffect::IsoeffectiveDoseInverter;
use crate::model::bed::BedEngine;
use crate::model::config::ModelConfig;
use crate::model::types::{IsoeffectResult, RdParams, Schedule};

/// One target fraction count of an [IsoeffectTable]
///
/// Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IsoeffectRow {
    pub fractions: u32,
    pub result: Option<IsoeffectResult>,
    pub error: Option<String>,
    /// [DomainError::kind] of the failure
    pub error_kind: Option<&'static str>,
}

impl IsoeffectRow {
    fn from_outcome(fractions: u32, outcome: Result<IsoeffectResult, DomainError>) -> Self {
        match outcome {
            Ok(result) => IsoeffectRow {
                fractions,
                result: Some(result),
                error: None,
                error_kind: None,
            },
            Err(err) => IsoeffectRow {
                fractions,
                result: None,
                error: Some(err.to_string()),
                error_kind: Some(err.kind()),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_some()
    }
}

/// Isoeffective schedules of one reference schedule for several fraction counts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IsoeffectTable {
    pub reference_bed: f64,
    pub rows: Vec<IsoeffectRow>,
}

impl IsoeffectTable {
    /// Evaluate every entry of `targets` independently.
    ///
    /// A failing row does not affect the others. Only a reference schedule whose BED
    /// cannot be computed fails the whole table.
    pub fn compute(
        config: ModelConfig,
        reference: &Schedule,
        rd: &RdParams,
        targets: &[u32],
    ) -> Result<Self, DomainError> {
        let reference_bed = BedEngine::new(config).bed(
            reference.total_dose(),
            reference.fractions() as f64,
            rd.r,
            rd.s,
        )?;
        let inverter = IsoeffectiveDoseInverter::new(config);

        // Indexed parallel iterators keep the order of `targets`
        let rows = targets
            .par_iter()
            .map(|&n2| {
                let outcome = inverter.invert_with_diagnostics(reference_bed, rd.r, rd.s, n2);
                IsoeffectRow::from_outcome(n2, outcome)
            })
            .collect::<Vec<_>>();

        Ok(IsoeffectTable {
            reference_bed,
            rows,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &IsoeffectRow> {
        self.rows.iter().filter(|row| !row.is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_keep_target_order() {
        let reference = Schedule::new(60.0, 30).unwrap();
        let targets: Vec<u32> = (1..=40).rev().collect();
        let table = IsoeffectTable::compute(
            ModelConfig::default(),
            &reference,
            &RdParams::new(0.6, 0.15),
            &targets,
        )
        .unwrap();
        let fractions: Vec<u32> = table.rows.iter().map(|row| row.fractions).collect();
        assert_eq!(fractions, targets);
        assert_eq!(table.failures().count(), 0);
    }

    #[test]
    fn test_failing_row_is_isolated() {
        let reference = Schedule::new(54.0, 3).unwrap();
        let table = IsoeffectTable::compute(
            ModelConfig::default(),
            &reference,
            &RdParams::new(0.5414, 0.1694),
            &[5, 0, 3],
        )
        .unwrap();
        assert!(table.rows[0].is_ok());
        assert!(!table.rows[1].is_ok());
        assert!(table.rows[1].error.is_some());
        assert_eq!(table.rows[1].error_kind, Some("invalid_parameter"));
        assert!(table.rows[2].is_ok());
        let same = table.rows[2].result.unwrap();
        assert!((same.new_total_dose - 54.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_reference_fails_table() {
        let reference = Schedule::new(54.0, 3).unwrap();
        let result = IsoeffectTable::compute(
            ModelConfig::default(),
            &reference,
            &RdParams::new(1.0, 0.1694),
            &[5],
        );
        assert!(matches!(result, Err(DomainError::Singular { .. })));
    }
}
