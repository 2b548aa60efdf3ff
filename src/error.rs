use thiserror::Error;

use crate::types::ParentRole;

/// Errors raised by the genetics library
#[derive(Debug, Error)]
pub enum GeneticsError {
    /// A required genotype was not supplied to the estimator
    #[error("missing {0} genotype")]
    MissingGenotype(ParentRole),

    #[error("could not load genetic data for dog {0}")]
    DataUnavailable(String),

    #[error("invalid record at line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, GeneticsError>;
