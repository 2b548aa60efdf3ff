//! Lookup tables and normalizer settings.
//!
//! Everything here can be overridden from a TOML file; omitted sections fall
//! back to the built-in defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::types::Locus;

/// Order in which a dog's tests are applied during normalization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessingOrder {
    /// As recorded; the last test in the list wins
    #[default]
    Input,
    /// Sorted by test date so the most recent test wins
    OldestFirst,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Test type that carries the color panel
    pub color_panel_test: String,
    pub order: ProcessingOrder,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            color_panel_test: "Color Panel".to_string(),
            order: ProcessingOrder::Input,
        }
    }
}

/// Closed lookup tables consumed by the pairing estimator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorTables {
    pub compared_loci: Vec<Locus>,
    /// Base color to dilute counterpart
    pub dilution_substitutions: BTreeMap<String, String>,
    /// Breed name to breed-specific risk strings
    pub breed_risks: BTreeMap<String, Vec<String>>,
}

impl Default for EstimatorTables {
    fn default() -> Self {
        Self {
            compared_loci: Locus::ALL.to_vec(),
            dilution_substitutions: default_dilution_substitutions(),
            breed_risks: default_breed_risks(),
        }
    }
}

impl EstimatorTables {
    /// Risks listed for a breed, matched case-insensitively
    pub fn risks_for_breed(&self, breed: &str) -> Option<&[String]> {
        let wanted = breed.trim().to_lowercase();
        self.breed_risks
            .iter()
            .find(|(name, _)| name.trim().to_lowercase() == wanted)
            .map(|(_, risks)| risks.as_slice())
    }
}

fn default_dilution_substitutions() -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    map.insert("black".into(), "blue".into());
    map.insert("liver".into(), "isabella".into());
    map.insert("red".into(), "cream".into());
    map
}

fn default_breed_risks() -> BTreeMap<String, Vec<String>> {
    let mut map = BTreeMap::new();

    map.insert(
        "Labrador Retriever".into(),
        vec![
            "Hip dysplasia risk".into(),
            "Elbow dysplasia risk".into(),
            "Exercise-induced collapse risk".into(),
        ],
    );
    map.insert(
        "German Shepherd".into(),
        vec![
            "Hip dysplasia risk".into(),
            "Degenerative myelopathy risk".into(),
        ],
    );
    map.insert(
        "Bulldog".into(),
        vec![
            "Brachycephalic airway syndrome risk".into(),
            "Heat intolerance risk".into(),
        ],
    );

    map
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub normalizer: NormalizerConfig,
    pub estimator: EstimatorTables,
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load from `path` when given, otherwise use the defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.estimator.compared_loci.len(), 4);
        assert_eq!(config.normalizer.color_panel_test, "Color Panel");
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_toml_str(
            r#"
[normalizer]
order = "oldest-first"

[estimator]
compared_loci = ["base-color", "dilution"]

[estimator.breed_risks]
"Poodle" = ["Addison's disease risk"]
"#,
        )
        .unwrap();

        assert_eq!(config.normalizer.order, ProcessingOrder::OldestFirst);
        assert_eq!(config.normalizer.color_panel_test, "Color Panel");
        assert_eq!(
            config.estimator.compared_loci,
            vec![Locus::BaseColor, Locus::Dilution]
        );
        // A given table replaces the default one
        assert!(config.estimator.risks_for_breed("Bulldog").is_none());
        assert_eq!(
            config.estimator.risks_for_breed("poodle").unwrap(),
            &["Addison's disease risk".to_string()]
        );
        assert_eq!(config.estimator.dilution_substitutions.len(), 3);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Config::from_toml_str("[normalizer]\norder = 3").unwrap_err();
        assert!(matches!(err, crate::error::GeneticsError::Config(_)));
    }
}
