//! Genotype normalizer.
//!
//! Turns a dog's raw lab tests into a canonical [`DogGenotype`]:
//! - color-panel tokens set the four color loci
//! - `<status> (<genotype>)` results become health markers
//! - anything else is kept in the audit trail and listed as unparsed

use tracing::debug;

use crate::config::{NormalizerConfig, ProcessingOrder};
use crate::parsers::lab_result::{parse_lab_result, LabResult};
use crate::types::{DogGenotype, DogTestRecord, HealthMarker, RawGeneticTest};

/// Normalizer for raw genetic test records
#[derive(Debug, Clone, Default)]
pub struct GenotypeNormalizer {
    config: NormalizerConfig,
}

impl GenotypeNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize one dog's record. Never fails; malformed results only
    /// leave loci unknown or markers absent.
    pub fn normalize(&self, record: &DogTestRecord) -> DogGenotype {
        let mut genotype = DogGenotype::unknown(record.dog_id.clone());
        genotype.test_results = record.tests.clone();

        for test in self.processing_order(&record.tests) {
            self.apply_test(&mut genotype, test);
        }

        genotype
    }

    /// Normalize many records, preserving their order
    pub fn normalize_all(&self, records: &[DogTestRecord]) -> Vec<DogGenotype> {
        records.iter().map(|record| self.normalize(record)).collect()
    }

    fn processing_order<'a>(&self, tests: &'a [RawGeneticTest]) -> Vec<&'a RawGeneticTest> {
        let mut ordered: Vec<&RawGeneticTest> = tests.iter().collect();
        if self.config.order == ProcessingOrder::OldestFirst {
            // Stable: same-day tests keep their recorded order
            ordered.sort_by_key(|test| test.test_date);
        }
        ordered
    }

    fn apply_test(&self, genotype: &mut DogGenotype, test: &RawGeneticTest) {
        match parse_lab_result(&test.test_type, &test.result, &self.config.color_panel_test) {
            LabResult::ColorPanel(assignments) => {
                for (locus, alleles) in assignments {
                    genotype.set_locus(locus, alleles);
                }
            }
            LabResult::Marker { status, genotype: alleles } => {
                genotype.health_markers.insert(
                    test.test_type.clone(),
                    HealthMarker {
                        status,
                        genotype: alleles,
                        test_date: test.test_date,
                        lab_name: test.lab_name.clone(),
                    },
                );
            }
            LabResult::Unparsed(raw) => {
                debug!(
                    "Unrecognised result for {} test on {}: {:?}",
                    test.test_type, genotype.dog_id, raw
                );
                if !genotype.unparsed_tests.contains(&test.test_type) {
                    genotype.unparsed_tests.push(test.test_type.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MarkerStatus, UNKNOWN};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test(test_type: &str, when: NaiveDate, result: &str) -> RawGeneticTest {
        RawGeneticTest::new(test_type, when, result, "Embark")
    }

    #[test]
    fn test_empty_record_is_unknown() {
        let genotype = GenotypeNormalizer::new().normalize(&DogTestRecord::new("rex"));

        assert_eq!(genotype, DogGenotype::unknown("rex"));
        assert_eq!(genotype.base_color, UNKNOWN);
        assert_eq!(genotype.agouti, UNKNOWN);
        assert!(genotype.health_markers.is_empty());
    }

    #[test]
    fn test_color_panel_and_markers() {
        let record = DogTestRecord::new("rex")
            .with_test(test("Color Panel", date(2023, 1, 1), "E/e, B/b, D/d, a/a"))
            .with_test(test("DM", date(2023, 1, 1), "Clear (N/N)"))
            .with_test(test("PRA-prcd", date(2023, 1, 1), "Carrier (N/A)"));

        let genotype = GenotypeNormalizer::new().normalize(&record);

        assert_eq!(genotype.base_color, "E/e");
        assert_eq!(genotype.brown_dilution, "B/b");
        assert_eq!(genotype.dilution, "D/d");
        assert_eq!(genotype.agouti, "a/a");
        assert_eq!(genotype.marker_status("DM"), Some(MarkerStatus::Clear));
        assert_eq!(genotype.marker_status("PRA-prcd"), Some(MarkerStatus::Carrier));
        assert_eq!(genotype.health_markers["DM"].genotype, "N/N");
        assert_eq!(genotype.health_markers["DM"].lab_name, "Embark");
        assert_eq!(genotype.test_results.len(), 3);
        assert!(genotype.unparsed_tests.is_empty());
    }

    #[test]
    fn test_last_token_wins_within_panel() {
        let record = DogTestRecord::new("rex")
            .with_test(test("Color Panel", date(2023, 1, 1), "E/E, E/e"));
        let genotype = GenotypeNormalizer::new().normalize(&record);
        assert_eq!(genotype.base_color, "E/e");
    }

    #[test]
    fn test_input_order_last_panel_wins() {
        let record = DogTestRecord::new("rex")
            .with_test(test("Color Panel", date(2024, 6, 1), "E/E"))
            .with_test(test("Color Panel", date(2020, 6, 1), "E/e"));

        let genotype = GenotypeNormalizer::new().normalize(&record);
        assert_eq!(genotype.base_color, "E/e");
    }

    #[test]
    fn test_oldest_first_most_recent_panel_wins() {
        let record = DogTestRecord::new("rex")
            .with_test(test("Color Panel", date(2024, 6, 1), "E/E"))
            .with_test(test("Color Panel", date(2020, 6, 1), "E/e"));

        let normalizer = GenotypeNormalizer::with_config(NormalizerConfig {
            order: ProcessingOrder::OldestFirst,
            ..Default::default()
        });
        let genotype = normalizer.normalize(&record);

        assert_eq!(genotype.base_color, "E/E");
        // Audit trail keeps insertion order regardless
        assert_eq!(genotype.test_results[0].result, "E/E");
    }

    #[test]
    fn test_lowercase_leading_tokens_are_ignored() {
        let record = DogTestRecord::new("rex")
            .with_test(test("Color Panel", date(2023, 1, 1), "e/e, b/b, d/d, a/a"));

        let genotype = GenotypeNormalizer::new().normalize(&record);

        assert_eq!(genotype.base_color, UNKNOWN);
        assert_eq!(genotype.brown_dilution, UNKNOWN);
        assert_eq!(genotype.dilution, UNKNOWN);
        assert_eq!(genotype.agouti, "a/a");
        assert_eq!(genotype.dilution_status(), None);
    }

    #[test]
    fn test_malformed_result_is_kept_but_unparsed() {
        let record = DogTestRecord::new("rex")
            .with_test(test("DM", date(2023, 1, 1), "Pending"))
            .with_test(test("EIC", date(2023, 1, 1), "Clear (N/N)"));

        let genotype = GenotypeNormalizer::new().normalize(&record);

        assert!(!genotype.health_markers.contains_key("DM"));
        assert!(genotype.health_markers.contains_key("EIC"));
        assert!(genotype.test_results.iter().any(|t| t.test_type == "DM"));
        assert_eq!(genotype.unparsed_tests, vec!["DM".to_string()]);
    }

    #[test]
    fn test_markers_have_parsed_source() {
        let record = DogTestRecord::new("rex")
            .with_test(test("DM", date(2023, 1, 1), "Carrier (N/m)"))
            .with_test(test("CDDY", date(2023, 1, 1), "??"))
            .with_test(test("Color Panel", date(2023, 1, 1), "E/e"));

        let genotype = GenotypeNormalizer::new().normalize(&record);
        for condition in genotype.health_markers.keys() {
            assert!(genotype
                .test_results
                .iter()
                .any(|t| &t.test_type == condition && t.result.contains('(')));
        }
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let record = DogTestRecord::new("rex")
            .with_test(test("Color Panel", date(2023, 1, 1), "E/e, D/d"))
            .with_test(test("DM", date(2023, 1, 1), "Affected (m/m)"));

        let normalizer = GenotypeNormalizer::new();
        assert_eq!(normalizer.normalize(&record), normalizer.normalize(&record));
    }
}
