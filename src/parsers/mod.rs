//! Record importers and the lab result classifier.
//!
//! Importers turn files exported from the kennel's record store into
//! [`DogTestRecord`]s; [`lab_result`] classifies the free-text results inside
//! them.

pub mod delimited;
pub mod json_records;
pub mod lab_result;

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

use crate::error::{GeneticsError, Result};
use crate::types::{DogTestRecord, FileFormat, RawGeneticTest};

pub use delimited::DelimitedParser;
pub use json_records::JsonRecordParser;
pub use lab_result::{parse_lab_result, LabResult};

/// Common interface of the record importers, one per [`FileFormat`]
pub trait RecordParser {
    fn parse(&self, path: &Path) -> Result<Vec<DogTestRecord>>;
}

/// Dispatches to the importer matching a file's format
pub struct FileParser;

impl Default for FileParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FileParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, path: &Path) -> Result<Vec<DogTestRecord>> {
        let format = detect_format(path);
        debug!("Parsing {} as {:?}", path.display(), format);

        self.parser_for(format, path)?.parse(path)
    }

    fn parser_for(&self, format: FileFormat, path: &Path) -> Result<Box<dyn RecordParser>> {
        match format {
            FileFormat::CSV => Ok(Box::new(DelimitedParser::new(b','))),
            FileFormat::TSV => Ok(Box::new(DelimitedParser::new(b'\t'))),
            FileFormat::JSON => Ok(Box::new(JsonRecordParser::new())),
            FileFormat::Unknown => Err(GeneticsError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("unsupported record file: {}", path.display()),
            ))),
        }
    }

    /// Parse several files and merge records for the same dog in file order
    pub fn parse_all<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<DogTestRecord>> {
        let mut records = Vec::new();
        for path in paths {
            records.extend(self.parse(path.as_ref())?);
        }
        Ok(merge_records(records))
    }
}

/// Format from the file extension, looking through a trailing `.gz`
pub fn detect_format(path: &Path) -> FileFormat {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let name = name.strip_suffix(".gz").unwrap_or(&name);

    match Path::new(name).extension() {
        Some(ext) => FileFormat::from_extension(&ext.to_string_lossy()),
        None => FileFormat::Unknown,
    }
}

/// Open a file for buffered reading, decompressing `.gz` files
pub fn open_file(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let is_gzip = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);

    if is_gzip {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Merge records sharing a dog id. Dogs keep first-seen order, tests keep
/// the order they were read in, and the first non-empty breed wins.
pub fn merge_records(records: Vec<DogTestRecord>) -> Vec<DogTestRecord> {
    let mut merged: Vec<DogTestRecord> = Vec::new();

    for record in records {
        match merged.iter_mut().find(|r| r.dog_id == record.dog_id) {
            Some(existing) => {
                if existing.breed.is_none() {
                    existing.breed = record.breed;
                }
                existing.tests.extend(record.tests);
            }
            None => merged.push(record),
        }
    }

    merged
}

/// Append one test row to the record for `dog_id`, creating it if needed
pub(crate) fn push_test(
    records: &mut Vec<DogTestRecord>,
    dog_id: &str,
    breed: Option<String>,
    test: Option<RawGeneticTest>,
) {
    let index = match records.iter().position(|r| r.dog_id == dog_id) {
        Some(index) => index,
        None => {
            records.push(DogTestRecord::new(dog_id));
            records.len() - 1
        }
    };

    let record = &mut records[index];
    if record.breed.is_none() {
        record.breed = breed;
    }
    if let Some(test) = test {
        record.tests.push(test);
    }
}
