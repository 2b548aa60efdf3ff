use rayon::prelude::*;
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::config::{Config, EstimatorTables};
use crate::error::{GeneticsError, Result};
use crate::normalizer::GenotypeNormalizer;
use crate::source::RecordSource;
use crate::types::*;

/// Sire/dam pairing compatibility estimator
#[derive(Debug, Clone, Default)]
pub struct PairingEstimator {
    tables: EstimatorTables,
}

/// Matched and conflicting locus labels for a pairing
#[derive(Debug, Default)]
struct TraitComparison {
    matched: Vec<String>,
    conflicting: Vec<String>,
}

impl PairingEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(tables: EstimatorTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &EstimatorTables {
        &self.tables
    }

    /// Estimate one pairing. Both genotypes are required; everything else,
    /// including fully unknown genotypes, yields a valid result.
    pub fn estimate(
        &self,
        sire: Option<&DogGenotype>,
        dam: Option<&DogGenotype>,
        sire_breed: Option<&str>,
        dam_breed: Option<&str>,
    ) -> Result<PairingResult> {
        let sire = sire.ok_or(GeneticsError::MissingGenotype(ParentRole::Sire))?;
        let dam = dam.ok_or(GeneticsError::MissingGenotype(ParentRole::Dam))?;

        let traits = self.compare_traits(sire, dam);
        let compatibility_score =
            calculate_compatibility_score(traits.matched.len(), traits.conflicting.len());
        let potential_colors = self.predict_colors(sire, dam);
        let health_risks = self.identify_health_risks(sire, dam, sire_breed, dam_breed);

        debug!(
            "Pairing {} x {}: score {}, {} matched, {} conflicting",
            sire.dog_id,
            dam.dog_id,
            compatibility_score,
            traits.matched.len(),
            traits.conflicting.len()
        );

        Ok(PairingResult {
            sire_id: sire.dog_id.clone(),
            dam_id: dam.dog_id.clone(),
            compatibility_score,
            is_compatible: !traits.matched.is_empty(),
            matched_traits: traits.matched,
            conflicting_traits: traits.conflicting,
            potential_colors,
            health_risks,
        })
    }

    fn compare_traits(&self, sire: &DogGenotype, dam: &DogGenotype) -> TraitComparison {
        let mut traits = TraitComparison::default();

        for &locus in &self.tables.compared_loci {
            let sire_value = sire.locus(locus);
            let dam_value = dam.locus(locus);

            if sire_value == dam_value {
                if sire_value != UNKNOWN {
                    traits.matched.push(format!("{}: {}", locus, sire_value));
                }
            } else {
                traits
                    .conflicting
                    .push(format!("{}: Sire {}, Dam {}", locus, sire_value, dam_value));
            }
        }

        traits
    }

    fn predict_colors(&self, sire: &DogGenotype, dam: &DogGenotype) -> BTreeSet<String> {
        let mut colors: BTreeSet<String> = [&sire.base_color, &dam.base_color]
            .into_iter()
            .filter(|color| color.as_str() != UNKNOWN)
            .cloned()
            .collect();

        let dilution_present = [sire, dam].iter().any(|parent| {
            parent
                .dilution_status()
                .map(|status| status.is_carrier_or_affected())
                .unwrap_or(false)
        });

        if dilution_present {
            let dilutes: Vec<String> = self
                .tables
                .dilution_substitutions
                .iter()
                .filter(|(base, _)| colors.contains(base.as_str()))
                .map(|(_, dilute)| dilute.clone())
                .collect();
            colors.extend(dilutes);
        }

        colors
    }

    fn identify_health_risks(
        &self,
        sire: &DogGenotype,
        dam: &DogGenotype,
        sire_breed: Option<&str>,
        dam_breed: Option<&str>,
    ) -> Vec<String> {
        let mut risks: Vec<String> = sire
            .health_markers
            .iter()
            .filter(|(condition, marker)| {
                marker.status == MarkerStatus::Carrier
                    && dam.marker_status(condition) == Some(MarkerStatus::Carrier)
            })
            .map(|(condition, _)| format!("Both parents are carriers for {}", condition))
            .collect();

        if let (Some(sire_breed), Some(dam_breed)) = (sire_breed, dam_breed) {
            if same_breed(sire_breed, dam_breed) {
                if let Some(breed_risks) = self.tables.risks_for_breed(sire_breed) {
                    risks.extend(breed_risks.iter().cloned());
                }
            }
        }

        risks
    }
}

/// Share of matched traits as a percentage, 0 when nothing was compared
pub fn calculate_compatibility_score(matched: usize, conflicting: usize) -> u8 {
    let total = matched + conflicting;
    if total == 0 {
        return 0;
    }
    (matched as f64 / total as f64 * 100.0).round() as u8
}

fn same_breed(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Fetches records, normalizes them and estimates pairings
pub struct PairingAnalyzer<S: RecordSource> {
    source: S,
    normalizer: GenotypeNormalizer,
    estimator: PairingEstimator,
}

impl<S: RecordSource> PairingAnalyzer<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, Config::default())
    }

    pub fn with_config(source: S, config: Config) -> Self {
        Self {
            source,
            normalizer: GenotypeNormalizer::with_config(config.normalizer),
            estimator: PairingEstimator::with_tables(config.estimator),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch and normalize one dog, returning its genotype and breed
    pub fn genotype(&self, dog_id: &str) -> Result<(DogGenotype, Option<String>)> {
        let record = self.source.require(dog_id)?;
        let genotype = self.normalizer.normalize(&record);
        Ok((genotype, record.breed))
    }

    /// Evaluate a single sire/dam pairing
    pub fn evaluate_pair(&self, sire_id: &str, dam_id: &str) -> Result<PairingResult> {
        let (sire, sire_breed) = self.genotype(sire_id)?;
        let (dam, dam_breed) = self.genotype(dam_id)?;

        self.estimator.estimate(
            Some(&sire),
            Some(&dam),
            sire_breed.as_deref(),
            dam_breed.as_deref(),
        )
    }

    /// Evaluate many pairings in parallel. Results keep the order of `pairs`.
    pub fn evaluate_pairs(&self, pairs: &[(String, String)]) -> Vec<Result<PairingResult>> {
        info!("Evaluating {} pairings", pairs.len());

        pairs
            .par_iter()
            .map(|(sire_id, dam_id)| self.evaluate_pair(sire_id, dam_id))
            .collect()
    }
}

/// Every sire/dam combination of two id lists, skipping a dog paired with itself
pub fn cross_pairs(sires: &[String], dams: &[String]) -> Vec<(String, String)> {
    sires
        .iter()
        .flat_map(|sire| {
            dams.iter()
                .filter(move |dam| *dam != sire)
                .map(move |dam| (sire.clone(), dam.clone()))
        })
        .collect()
}
