use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Placeholder value for a locus no color-panel token has set
pub const UNKNOWN: &str = "unknown";

/// A single lab genetic test as recorded for one dog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGeneticTest {
    pub test_type: String,
    pub test_date: NaiveDate,
    pub result: String,
    #[serde(default)]
    pub lab_name: String,
}

impl RawGeneticTest {
    pub fn new(
        test_type: impl Into<String>,
        test_date: NaiveDate,
        result: impl Into<String>,
        lab_name: impl Into<String>,
    ) -> Self {
        Self {
            test_type: test_type.into(),
            test_date,
            result: result.into(),
            lab_name: lab_name.into(),
        }
    }
}

/// All raw tests recorded for one dog, as handed over by a record source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DogTestRecord {
    pub dog_id: String,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub tests: Vec<RawGeneticTest>,
}

impl DogTestRecord {
    pub fn new(dog_id: impl Into<String>) -> Self {
        Self {
            dog_id: dog_id.into(),
            breed: None,
            tests: Vec::new(),
        }
    }

    pub fn with_breed(mut self, breed: impl Into<String>) -> Self {
        self.breed = Some(breed.into());
        self
    }

    pub fn with_test(mut self, test: RawGeneticTest) -> Self {
        self.tests.push(test);
        self
    }
}

/// Color loci read from a color panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Locus {
    BaseColor,
    BrownDilution,
    Dilution,
    Agouti,
}

impl Locus {
    pub const ALL: [Locus; 4] = [
        Locus::BaseColor,
        Locus::BrownDilution,
        Locus::Dilution,
        Locus::Agouti,
    ];

    /// Locus selected by the first character of a color-panel token
    pub fn from_token(token: &str) -> Option<Self> {
        match token.chars().next()? {
            'E' => Some(Locus::BaseColor),
            'B' => Some(Locus::BrownDilution),
            'D' => Some(Locus::Dilution),
            'a' => Some(Locus::Agouti),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Locus::BaseColor => "Base Color",
            Locus::BrownDilution => "Brown Dilution",
            Locus::Dilution => "Dilution",
            Locus::Agouti => "Agouti",
        }
    }
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Health marker status reported by a lab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerStatus {
    Clear,
    Carrier,
    Affected,
}

impl MarkerStatus {
    /// Map a lab status word. Anything not recognised as clear or carrier is
    /// reported as affected.
    pub fn from_status_word(word: &str) -> Self {
        match word.trim().to_lowercase().as_str() {
            "clear" | "normal" => MarkerStatus::Clear,
            "carrier" => MarkerStatus::Carrier,
            _ => MarkerStatus::Affected,
        }
    }

    /// Status implied by a dilution allele pair (`D/D`, `D/d`, `d/d`) or an
    /// explicit status word. `None` when neither form is recognised.
    pub fn from_dilution(value: &str) -> Option<Self> {
        let value = value.trim();
        match value.to_lowercase().as_str() {
            "clear" | "normal" => return Some(MarkerStatus::Clear),
            "carrier" => return Some(MarkerStatus::Carrier),
            "affected" => return Some(MarkerStatus::Affected),
            _ => {}
        }

        let alleles: Vec<&str> = value.split('/').map(str::trim).collect();
        if alleles.len() != 2 {
            return None;
        }

        let mut recessive = 0;
        for allele in &alleles {
            match *allele {
                "D" => {}
                "d" => recessive += 1,
                _ => return None,
            }
        }

        Some(match recessive {
            0 => MarkerStatus::Clear,
            1 => MarkerStatus::Carrier,
            _ => MarkerStatus::Affected,
        })
    }

    pub fn is_carrier_or_affected(&self) -> bool {
        matches!(self, MarkerStatus::Carrier | MarkerStatus::Affected)
    }
}

impl fmt::Display for MarkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            MarkerStatus::Clear => "clear",
            MarkerStatus::Carrier => "carrier",
            MarkerStatus::Affected => "affected",
        };
        f.write_str(word)
    }
}

/// Canonical health marker entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthMarker {
    pub status: MarkerStatus,
    pub genotype: String,
    pub test_date: NaiveDate,
    pub lab_name: String,
}

/// Canonical per-dog genotype derived from raw lab tests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DogGenotype {
    pub dog_id: String,
    pub base_color: String,
    pub brown_dilution: String,
    pub dilution: String,
    pub agouti: String,
    pub health_markers: BTreeMap<String, HealthMarker>,
    pub test_results: Vec<RawGeneticTest>,
    /// Test types whose result was present but in no recognised format
    #[serde(default)]
    pub unparsed_tests: Vec<String>,
}

impl DogGenotype {
    /// Genotype with every locus unknown and no markers
    pub fn unknown(dog_id: impl Into<String>) -> Self {
        Self {
            dog_id: dog_id.into(),
            base_color: UNKNOWN.to_string(),
            brown_dilution: UNKNOWN.to_string(),
            dilution: UNKNOWN.to_string(),
            agouti: UNKNOWN.to_string(),
            health_markers: BTreeMap::new(),
            test_results: Vec::new(),
            unparsed_tests: Vec::new(),
        }
    }

    pub fn locus(&self, locus: Locus) -> &str {
        match locus {
            Locus::BaseColor => &self.base_color,
            Locus::BrownDilution => &self.brown_dilution,
            Locus::Dilution => &self.dilution,
            Locus::Agouti => &self.agouti,
        }
    }

    pub fn set_locus(&mut self, locus: Locus, value: impl Into<String>) {
        let value = value.into();
        match locus {
            Locus::BaseColor => self.base_color = value,
            Locus::BrownDilution => self.brown_dilution = value,
            Locus::Dilution => self.dilution = value,
            Locus::Agouti => self.agouti = value,
        }
    }

    pub fn dilution_status(&self) -> Option<MarkerStatus> {
        MarkerStatus::from_dilution(&self.dilution)
    }

    pub fn marker_status(&self, condition: &str) -> Option<MarkerStatus> {
        self.health_markers.get(condition).map(|m| m.status)
    }
}

/// Outcome of estimating one sire/dam pairing
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingResult {
    pub sire_id: String,
    pub dam_id: String,
    pub compatibility_score: u8,
    pub matched_traits: Vec<String>,
    pub conflicting_traits: Vec<String>,
    pub potential_colors: BTreeSet<String>,
    /// True when the parents share at least one known color locus value.
    /// This is a shared-trait signal, not a breeding recommendation.
    pub is_compatible: bool,
    pub health_risks: Vec<String>,
}

/// Which parent a genotype belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentRole {
    Sire,
    Dam,
}

impl fmt::Display for ParentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentRole::Sire => f.write_str("sire"),
            ParentRole::Dam => f.write_str("dam"),
        }
    }
}

/// Input file formats accepted by the record importers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FileFormat {
    CSV,
    TSV,
    JSON,
    Unknown,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "csv" => FileFormat::CSV,
            "tsv" | "txt" => FileFormat::TSV,
            "json" => FileFormat::JSON,
            _ => FileFormat::Unknown,
        }
    }

    pub fn is_record_format(&self) -> bool {
        !matches!(self, FileFormat::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locus_from_token() {
        assert_eq!(Locus::from_token("E/e"), Some(Locus::BaseColor));
        assert_eq!(Locus::from_token("B/b"), Some(Locus::BrownDilution));
        assert_eq!(Locus::from_token("D/d"), Some(Locus::Dilution));
        assert_eq!(Locus::from_token("a/a"), Some(Locus::Agouti));
        // Only lowercase a selects agouti
        assert_eq!(Locus::from_token("Ay/at"), None);
        assert_eq!(Locus::from_token(""), None);
    }

    #[test]
    fn test_status_word_mapping() {
        assert_eq!(MarkerStatus::from_status_word("Clear"), MarkerStatus::Clear);
        assert_eq!(MarkerStatus::from_status_word("NORMAL"), MarkerStatus::Clear);
        assert_eq!(MarkerStatus::from_status_word("carrier"), MarkerStatus::Carrier);
        assert_eq!(MarkerStatus::from_status_word("At-Risk"), MarkerStatus::Affected);
    }

    #[test]
    fn test_dilution_status() {
        assert_eq!(MarkerStatus::from_dilution("D/D"), Some(MarkerStatus::Clear));
        assert_eq!(MarkerStatus::from_dilution("D/d"), Some(MarkerStatus::Carrier));
        assert_eq!(MarkerStatus::from_dilution("d/D"), Some(MarkerStatus::Carrier));
        assert_eq!(MarkerStatus::from_dilution("d/d"), Some(MarkerStatus::Affected));
        assert_eq!(MarkerStatus::from_dilution("Carrier"), Some(MarkerStatus::Carrier));
        assert_eq!(MarkerStatus::from_dilution(UNKNOWN), None);
        assert_eq!(MarkerStatus::from_dilution("Dd"), None);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(FileFormat::from_extension("CSV"), FileFormat::CSV);
        assert_eq!(FileFormat::from_extension("txt"), FileFormat::TSV);
        assert_eq!(FileFormat::from_extension("json"), FileFormat::JSON);
        assert!(!FileFormat::from_extension("vcf").is_record_format());
    }
}
