use config::Config as eConfig;
use eyre::{bail, Result, WrapErr};
use serde::Deserialize;
use serde_derive::Serialize;

use crate::error::DomainError;
use crate::model::config::ModelConfig;
use crate::model::types::{ClassicalParams, RdParams, Schedule};

use super::output::OutputFile;

/// Contains all settings for a dose-equivalence run
#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Settings {
    /// Sign policy, shoulder convention, tolerances and solver limits
    pub model: ModelConfig,
    /// Configuration for logging
    pub log: Log,
    /// Configuration for the output files
    pub output: Output,
    /// The tissue whose schedules are converted
    pub tissue: Tissue,
    /// The reference schedule
    pub schedule: ScheduleSettings,
    /// Fraction counts to convert the reference schedule to
    pub target: Target,
    /// Optional tumor/normal tissue comparison
    pub comparison: Option<Comparison>,
    /// Optional path to a JSON preset catalog replacing the bundled one
    pub presets: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            model: ModelConfig::default(),
            log: Log::default(),
            output: Output::default(),
            tissue: Tissue::default(),
            schedule: ScheduleSettings::default(),
            target: Target::default(),
            comparison: None,
            presets: None,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Settings::default()
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        self.schedule
            .to_schedule()
            .wrap_err("Invalid reference schedule")?;
        self.target.validate()?;
        Ok(())
    }
}

/// Survival-curve parameters of a tissue, in any supported form
#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
#[serde(tag = "form", rename_all = "snake_case", deny_unknown_fields)]
pub enum Tissue {
    Rd {
        r: f64,
        s: f64,
        #[serde(default)]
        k: Option<f64>,
    },
    LinearQuadratic {
        alpha: f64,
        beta: f64,
        d0: f64,
    },
    Shoulder {
        #[serde(alias = "alpha_by_beta")]
        alpha_beta: f64,
        #[serde(alias = "D_q", alias = "d_q")]
        dq: f64,
    },
    /// A named record of the preset catalog
    Preset { name: String },
}

impl Default for Tissue {
    fn default() -> Self {
        Tissue::Preset {
            name: String::from("NSCLC (H460) - Lung SBRT"),
        }
    }
}

/// Where the RD parameters of a [Tissue] come from
#[derive(Debug, Clone, PartialEq)]
pub enum TissueSource {
    Rd(RdParams),
    Classical(ClassicalParams),
    Preset(String),
}

impl Tissue {
    pub fn source(&self) -> TissueSource {
        match self {
            Tissue::Rd { r, s, k } => TissueSource::Rd(RdParams {
                r: *r,
                s: *s,
                k: *k,
            }),
            Tissue::LinearQuadratic { alpha, beta, d0 } => {
                TissueSource::Classical(ClassicalParams::linear_quadratic(*alpha, *beta, *d0))
            }
            Tissue::Shoulder { alpha_beta, dq } => {
                TissueSource::Classical(ClassicalParams::shoulder(*alpha_beta, *dq))
            }
            Tissue::Preset { name } => TissueSource::Preset(name.clone()),
        }
    }
}

/// The reference schedule as written in the configuration file
#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ScheduleSettings {
    /// Total dose, Gy
    pub dose: f64,
    /// Number of equal fractions
    pub fractions: u32,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        ScheduleSettings {
            dose: 54.0,
            fractions: 3,
        }
    }
}

impl ScheduleSettings {
    pub fn to_schedule(&self) -> Result<Schedule, DomainError> {
        Schedule::new(self.dose, self.fractions)
    }
}

#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Target {
    pub fractions: Vec<u32>,
}

impl Default for Target {
    fn default() -> Self {
        Target {
            fractions: vec![1, 3, 5, 8, 10, 15, 20, 25, 30],
        }
    }
}

impl Target {
    fn validate(&self) -> Result<()> {
        if self.fractions.is_empty() {
            bail!("At least one target fraction count must be given in [target]");
        }
        Ok(())
    }
}

/// Tumor and dose-limiting normal tissue for the fractionation recommendation
#[derive(Debug, Deserialize, Clone, Copy, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Comparison {
    pub tumor: ClassicalParams,
    pub normal: ClassicalParams,
}

#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Log {
    /// The maximum log level to display
    ///
    /// The log level is defined as a string, and can be one of the following:
    /// - `trace`
    /// - `debug`
    /// - `info`
    /// - `warn`
    /// - `error`
    pub level: String,
    /// The file to write the log to, inside the output folder
    pub file: String,
    /// Whether to install a global subscriber
    ///
    /// Set to `false` when embedding the crate in an application with its own subscriber.
    pub write: bool,
}

impl Default for Log {
    fn default() -> Self {
        Log {
            level: String::from("info"),
            file: String::from("log.txt"),
            write: true,
        }
    }
}

/// Configuration for the output files
#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Output {
    /// Whether to write the output files
    pub write: bool,
    /// The (relative) path to write the output files to
    pub path: String,
}

impl Default for Output {
    fn default() -> Self {
        Output {
            write: true,
            path: String::from("outputs/"),
        }
    }
}

impl Output {
    /// Parses the output folder location
    ///
    /// A single `#` is replaced by the first number that does not name an existing folder.
    pub fn parse_output_folder(&mut self) -> Result<()> {
        if self.path.is_empty() {
            self.path = Output::default().path;
        }

        match self.path.matches('#').count() {
            0 => Ok(()),
            1 => {
                let mut num = 1;
                while std::path::Path::new(&self.path.replace('#', &num.to_string())).exists() {
                    num += 1;
                }
                self.path = self.path.replace('#', &num.to_string());
                Ok(())
            }
            _ => {
                bail!("Only one `#` symbol is allowed in the output path. Rename `output.path` in the configuration file and re-run the program.")
            }
        }
    }
}

/// Parses the settings from a TOML configuration file
///
/// Entries may be overridden by environment variables prefixed with `RDBED_`, using a
/// double underscore between nested keys. For example, `RDBED_LOG__LEVEL=debug` sets
/// the log level and `RDBED_MODEL__SIGN_POLICY=permissive` relaxes the sign check on `s`.
pub fn read(path: impl Into<String>) -> Result<Settings> {
    let settings_path = path.into();

    let parsed = eConfig::builder()
        .add_source(config::File::with_name(&settings_path).format(config::FileFormat::Toml))
        .add_source(
            config::Environment::with_prefix("RDBED")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .wrap_err_with(|| format!("Failed to read settings from {}", settings_path))?;

    // Deserialize settings to the Settings struct
    let mut settings: Settings = parsed
        .try_deserialize()
        .wrap_err("Failed to parse settings")?;

    settings.validate()?;
    settings.output.parse_output_folder()?;

    Ok(settings)
}

/// Writes a copy of the parsed settings to `settings.json` in the output folder
pub fn write_settings_to_file(settings: &Settings) -> Result<()> {
    let serialized = serde_json::to_string_pretty(settings)?;

    let outputfile = OutputFile::new(settings.output.path.as_str(), "settings.json")?;
    let mut file = outputfile.file_owned();
    std::io::Write::write_all(&mut file, serialized.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_empty_targets_rejected() {
        let mut settings = Settings::default();
        settings.target.fractions.clear();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_invalid_schedule_rejected() {
        let mut settings = Settings::default();
        settings.schedule.fractions = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_tissue_forms_from_json() {
        let tissue: Tissue =
            serde_json::from_str(r#"{"form": "rd", "r": 0.6, "s": 0.15}"#).unwrap();
        assert_eq!(tissue.source(), TissueSource::Rd(RdParams::new(0.6, 0.15)));

        let tissue: Tissue = serde_json::from_str(
            r#"{"form": "linear_quadratic", "alpha": 0.3, "beta": 0.03, "d0": 1.5}"#,
        )
        .unwrap();
        assert_eq!(
            tissue.source(),
            TissueSource::Classical(ClassicalParams::linear_quadratic(0.3, 0.03, 1.5))
        );
    }

    #[test]
    fn test_output_folder_numbering() {
        let mut output = Output {
            write: true,
            path: String::from("rdbed-unlikely-folder-#"),
        };
        output.parse_output_folder().unwrap();
        assert_eq!(output.path, "rdbed-unlikely-folder-1");

        let mut output = Output {
            write: true,
            path: String::from("a#b#"),
        };
        assert!(output.parse_output_folder().is_err());
    }
}
