//! Record source adapter.
//!
//! The estimator only ever sees records that were already fetched; this is
//! the seam where a caller plugs in its own store.

use std::collections::HashMap;
use std::path::Path;

use crate::analysis::cross_pairs;
use crate::error::{GeneticsError, Result};
use crate::parsers::FileParser;
use crate::types::DogTestRecord;

/// Something that can hand over the raw test record of a dog
pub trait RecordSource: Send + Sync {
    /// `Ok(None)` when the source has no record for `dog_id`
    fn fetch(&self, dog_id: &str) -> Result<Option<DogTestRecord>>;

    /// Like [`fetch`](Self::fetch), but a miss is an error
    fn require(&self, dog_id: &str) -> Result<DogTestRecord> {
        self.fetch(dog_id)?
            .ok_or_else(|| GeneticsError::DataUnavailable(dog_id.to_string()))
    }
}

/// Records held in memory, keyed by dog id
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: HashMap<String, DogTestRecord>,
    order: Vec<String>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = DogTestRecord>) -> Self {
        let mut source = Self::new();
        for record in records {
            source.insert(record);
        }
        source
    }

    /// Load and merge every record file in `paths`
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let records = FileParser::new().parse_all(paths)?;
        Ok(Self::from_records(records))
    }

    /// Insert a record, replacing any earlier record for the same dog
    pub fn insert(&mut self, record: DogTestRecord) {
        if !self.records.contains_key(&record.dog_id) {
            self.order.push(record.dog_id.clone());
        }
        self.records.insert(record.dog_id.clone(), record);
    }

    /// Dog ids in insertion order
    pub fn dog_ids(&self) -> &[String] {
        &self.order
    }

    /// Every sire/dam combination of the loaded dogs, in insertion order
    pub fn all_pairs(&self) -> Vec<(String, String)> {
        cross_pairs(&self.order, &self.order)
    }

    pub fn records(&self) -> impl Iterator<Item = &DogTestRecord> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl RecordSource for InMemorySource {
    fn fetch(&self, dog_id: &str) -> Result<Option<DogTestRecord>> {
        Ok(self.records.get(dog_id).cloned())
    }
}
