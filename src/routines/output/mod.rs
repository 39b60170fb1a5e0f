use crate::isoeffect::table::IsoeffectTable;
use csv::WriterBuilder;
use eyre::{Result, WrapErr};
use serde::Serialize;
use std::fs::{create_dir_all, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Column names of `isoeffect.csv`
const ISOEFFECT_HEADER: [&str; 6] = [
    "fractions",
    "total_dose",
    "dose_per_fraction",
    "k",
    "w",
    "error",
];

/// Writes a serializable report as pretty-printed JSON
pub fn write_report<T: Serialize>(report: &T, folder: &str) -> Result<PathBuf> {
    let outputfile = OutputFile::new(folder, "report.json")
        .wrap_err("Failed to create output file for the report")?;
    serde_json::to_writer_pretty(outputfile.file(), report)?;
    tracing::debug!("Report written to {:?}", outputfile.relative_path());
    Ok(outputfile.relative_path().to_path_buf())
}

/// Writes one row per target fraction count
///
/// Failed rows keep their fraction count and carry the error message; the numeric
/// columns are left empty. Diagnostics `k` and `w` are empty on the linear branch.
pub fn write_isoeffect_table(table: &IsoeffectTable, folder: &str) -> Result<PathBuf> {
    let outputfile = OutputFile::new(folder, "isoeffect.csv")
        .wrap_err("Failed to create output file for the isoeffect table")?;
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(outputfile.file());

    writer.write_record(ISOEFFECT_HEADER)?;
    for row in &table.rows {
        let fmt = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();
        let record = match &row.result {
            Some(result) => [
                row.fractions.to_string(),
                result.new_total_dose.to_string(),
                result.new_per_fraction.to_string(),
                fmt(result.intermediate_k),
                fmt(result.lambert_w_value),
                String::new(),
            ],
            None => [
                row.fractions.to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                row.error.clone().unwrap_or_default(),
            ],
        };
        writer.write_record(&record)?;
    }
    writer.flush()?;
    tracing::debug!(
        "Isoeffect table written to {:?}",
        outputfile.relative_path()
    );
    Ok(outputfile.relative_path().to_path_buf())
}

/// Contains all the necessary information of an output file
#[derive(Debug)]
pub struct OutputFile {
    file: File,
    relative_path: PathBuf,
}

impl OutputFile {
    pub fn new(folder: &str, file_name: &str) -> Result<Self> {
        let relative_path = Path::new(&folder).join(file_name);

        if let Some(parent) = relative_path.parent() {
            create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create directories for {:?}", parent))?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&relative_path)
            .wrap_err_with(|| format!("Failed to open file: {:?}", relative_path))?;

        Ok(OutputFile {
            file,
            relative_path,
        })
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn file_owned(self) -> File {
        self.file
    }

    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }
}
