use crate::hypofractionation::{HypofractionationAssessment, HypofractionationComparator};
use crate::isoeffect::table::IsoeffectTable;
use crate::model::bed::BedEngine;
use crate::model::translate::ParameterTranslator;
use crate::model::types::{BedResult, ClassicalParams, RdParams, Schedule};
use crate::presets::{Preset, PresetCatalog};
use crate::routines::logger;
use crate::routines::output;
use crate::routines::settings::{self, Settings, TissueSource};

use eyre::{eyre, Result, WrapErr};
use serde::Serialize;
use std::time::Instant;

/// Everything computed for one set of settings
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// RD parameters of the tissue
    pub tissue: RdParams,
    /// The classical form determined by [Report::tissue], when it is defined
    pub classical: Option<ClassicalParams>,
    /// The preset the tissue was taken from, with its provenance
    pub preset: Option<Preset>,
    pub schedule: Schedule,
    pub bed: BedResult,
    /// Total dose in 2 Gy fractions with the reference BED
    pub eqd2: Option<f64>,
    pub isoeffect: IsoeffectTable,
    pub comparison: Option<HypofractionationAssessment>,
}

/// Evaluate the settings without touching the filesystem, other than reading presets
///
/// Domain failures of the reference schedule abort the evaluation. Failures of single
/// target fraction counts are kept in the table and logged.
pub fn evaluate(settings: &Settings) -> Result<Report> {
    let model = settings.model;
    let translator = ParameterTranslator::new(model);

    let (tissue, preset) = resolve_tissue(settings, &translator)?;
    tracing::debug!("Tissue parameters: r = {}, s = {}", tissue.r, tissue.s);

    let classical = match translator.rd_to_classical(tissue) {
        Ok(classical) => Some(classical),
        Err(err) => {
            tracing::debug!("No classical form for the tissue: {}", err);
            None
        }
    };

    let schedule = settings
        .schedule
        .to_schedule()
        .wrap_err("Invalid reference schedule")?;
    let bed = BedEngine::new(model)
        .evaluate(&schedule, &tissue)
        .wrap_err("Failed to compute the BED of the reference schedule")?;
    let eqd2 = bed.eqd2_total();
    tracing::info!(
        "{} Gy in {} fractions: BED = {:.4} Gy, EQD2 = {}",
        schedule.total_dose(),
        schedule.fractions(),
        bed.bed,
        eqd2.map(|v| format!("{:.4} Gy", v))
            .unwrap_or_else(|| String::from("undefined"))
    );

    let isoeffect = IsoeffectTable::compute(model, &schedule, &tissue, &settings.target.fractions)
        .wrap_err("Failed to compute the isoeffect table")?;
    for row in isoeffect.failures() {
        tracing::warn!(
            "No isoeffective schedule with {} fractions: {}",
            row.fractions,
            row.error.as_deref().unwrap_or_default()
        );
    }

    let comparison = settings
        .comparison
        .map(|c| HypofractionationComparator::new(model).assess(c.tumor, c.normal))
        .transpose()
        .wrap_err("Failed to compare tumor and normal tissue")?;
    if let Some(assessment) = &comparison {
        tracing::info!(
            "Tumor/normal ratio {:.4}: {}",
            assessment.ratio,
            assessment.recommendation
        );
    }

    Ok(Report {
        tissue,
        classical,
        preset,
        schedule,
        bed,
        eqd2,
        isoeffect,
        comparison,
    })
}

fn resolve_tissue(
    settings: &Settings,
    translator: &ParameterTranslator,
) -> Result<(RdParams, Option<Preset>)> {
    match settings.tissue.source() {
        TissueSource::Rd(rd) => Ok((rd, None)),
        TissueSource::Classical(classical) => {
            let rd = translator
                .classical_to_rd(classical)
                .wrap_err("Failed to translate the tissue parameters")?;
            Ok((rd, None))
        }
        TissueSource::Preset(name) => {
            let catalog = match &settings.presets {
                Some(path) => PresetCatalog::from_path(path)?,
                None => PresetCatalog::bundled()?,
            };
            let preset = catalog
                .get(&name)
                .ok_or_else(|| eyre!("Unknown preset '{}'", name))?
                .clone();
            if !preset.verified {
                tracing::warn!("Preset '{}' is not marked as verified", preset.name);
            }
            let rd = preset
                .rd(translator)
                .wrap_err_with(|| format!("Failed to translate preset '{}'", name))?;
            Ok((rd, Some(preset)))
        }
    }
}

/// Primary entrypoint
///
/// Reads the settings from a TOML configuration file, sets up logging, evaluates and
/// writes `settings.json`, `report.json` and `isoeffect.csv` if output is enabled.
pub fn run(settings_path: impl Into<String>) -> Result<Report> {
    let now = Instant::now();
    let settings = settings::read(settings_path)?;

    if settings.log.write {
        logger::setup_log(&settings)?;
    }
    tracing::info!("Starting rdbed");

    // Tell the user where the output files will be written
    match settings.output.write {
        true => tracing::info!("Output files will be written to {}", settings.output.path),
        false => tracing::info!("Output files will not be written - set `output.write = true` in the configuration file to enable output files"),
    }

    let report = match evaluate(&settings) {
        Ok(report) => report,
        Err(err) => {
            tracing::error!("Evaluation failed: {:#}", err);
            return Err(err);
        }
    };

    if settings.output.write {
        settings::write_settings_to_file(&settings)?;
        output::write_report(&report, &settings.output.path)?;
        output::write_isoeffect_table(&report.isoeffect, &settings.output.path)?;
    }

    tracing::info!("Program complete after {:.2?}", now.elapsed());
    Ok(report)
}
