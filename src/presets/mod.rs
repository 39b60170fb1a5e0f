//! Published cell-line parameter sets
//!
//! Records carry their citation as opaque text. Nothing here interprets or alters it.

use std::path::Path;

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::model::translate::ParameterTranslator;
use crate::model::types::{ClassicalParams, RdParams};

const BUNDLED: &str = include_str!("presets.json");

/// Parameters of a preset in whichever form they were published
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PresetParams {
    Classical(ClassicalParams),
    Rd(RdParams),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub params: PresetParams,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

impl Preset {
    /// RD parameters of the preset, translating classical records.
    pub fn rd(&self, translator: &ParameterTranslator) -> Result<RdParams, DomainError> {
        match self.params {
            PresetParams::Rd(rd) => Ok(rd),
            PresetParams::Classical(classical) => translator.classical_to_rd(classical),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetCatalog {
    presets: Vec<Preset>,
}

impl PresetCatalog {
    /// The catalog compiled into the crate.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED).wrap_err("Failed to parse the bundled presets")
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read presets from {}", path.display()))?;
        Self::from_json(&contents)
            .wrap_err_with(|| format!("Failed to parse presets from {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let presets: Vec<Preset> = serde_json::from_str(json)?;
        tracing::debug!("Loaded {} presets", presets.len());
        Ok(PresetCatalog { presets })
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }

    /// Verified records only, sorted by name.
    pub fn verified(&self) -> Vec<&Preset> {
        let mut verified: Vec<&Preset> = self.presets.iter().filter(|p| p.verified).collect();
        verified.sort_by(|a, b| a.name.cmp(&b.name));
        verified
    }

    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_catalog() {
        let catalog = PresetCatalog::bundled().unwrap();
        assert_eq!(catalog.len(), 5);
        let h460 = catalog.get("NSCLC (H460) - Lung SBRT").unwrap();
        assert_eq!(
            h460.params,
            PresetParams::Rd(RdParams::with_scale(0.5414, 0.1694, 0.641))
        );
        assert!(h460.source.contains("18262095"));
    }

    #[test]
    fn test_bundled_records_are_unverified() {
        let catalog = PresetCatalog::bundled().unwrap();
        assert!(catalog.iter().all(|p| !p.verified));
        assert!(catalog.verified().is_empty());
    }

    #[test]
    fn test_verified_sorted_by_name() {
        let json = r#"[
            {"name": "b", "params": {"r": 0.5, "s": 0.1}, "verified": true},
            {"name": "c", "params": {"r": 0.5, "s": 0.1}},
            {"name": "a", "params": {"form": "shoulder", "alpha_beta": 10.0, "dq": 1.5}, "verified": true}
        ]"#;
        let catalog = PresetCatalog::from_json(json).unwrap();
        let names: Vec<&str> = catalog.verified().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_classical_preset_is_translated() {
        let json = r#"[{"name": "a", "params": {"form": "shoulder", "alpha_beta": 10.0, "dq": 1.5}}]"#;
        let catalog = PresetCatalog::from_json(json).unwrap();
        let rd = catalog
            .get("a")
            .unwrap()
            .rd(&ParameterTranslator::default())
            .unwrap();
        assert!((rd.r - 0.5306623862918075).abs() < 1e-12);
    }
}
