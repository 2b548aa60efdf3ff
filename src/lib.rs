//! # Kennel Genetics
//!
//! Genotype normalization and sire/dam pairing estimates for breeding kennels.
//!
//! ## Features
//!
//! - Canonical genotypes from free-text lab results (color panels and
//!   `Clear (N/N)` style health markers)
//! - Pairing compatibility score with matched and conflicting color loci
//! - Predicted puppy coat colors including dilute counterparts
//! - Shared-carrier and breed-specific health risk flags
//! - CSV, TSV and JSON record import, batch evaluation across threads
//! - Multiple report formats (HTML, CSV, JSON, TSV)
//!
//! The estimates are a simplified illustrative heuristic, not a veterinary
//! diagnostic tool.

pub mod analysis;
pub mod config;
pub mod discovery;
pub mod error;
pub mod normalizer;
pub mod output;
pub mod parsers;
pub mod source;
pub mod types;

// Re-export key types
pub use analysis::{PairingAnalyzer, PairingEstimator};
pub use config::{Config, EstimatorTables, NormalizerConfig, ProcessingOrder};
pub use discovery::FileDiscovery;
pub use error::GeneticsError;
pub use normalizer::GenotypeNormalizer;
pub use output::{ReportFormat, ReportGenerator};
pub use parsers::{FileParser, LabResult};
pub use source::{InMemorySource, RecordSource};
pub use types::*;
