use serde::Deserialize;
use std::path::Path;

use crate::error::Result;
use crate::parsers::{merge_records, open_file, RecordParser};
use crate::types::DogTestRecord;

/// JSON importer. Accepts either an array of records or a single record.
pub struct JsonRecordParser;

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonPayload {
    Many(Vec<DogTestRecord>),
    One(DogTestRecord),
}

impl Default for JsonRecordParser {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonRecordParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_reader<R: std::io::Read>(&self, reader: R) -> Result<Vec<DogTestRecord>> {
        let records = match serde_json::from_reader(reader)? {
            JsonPayload::Many(records) => records,
            JsonPayload::One(record) => vec![record],
        };
        Ok(merge_records(records))
    }
}

impl RecordParser for JsonRecordParser {
    fn parse(&self, path: &Path) -> Result<Vec<DogTestRecord>> {
        self.parse_reader(open_file(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeneticsError;

    #[test]
    fn test_parse_array() {
        let json = r#"[
            {
                "dogId": "rex",
                "breed": "Bulldog",
                "tests": [
                    {"testType": "DM", "testDate": "2023-01-02", "result": "Carrier (N/m)", "labName": "Embark"}
                ]
            },
            {"dogId": "bella", "tests": []}
        ]"#;

        let records = JsonRecordParser::new().parse_reader(json.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].breed.as_deref(), Some("Bulldog"));
        assert_eq!(records[0].tests[0].result, "Carrier (N/m)");
        assert!(records[1].tests.is_empty());
    }

    #[test]
    fn test_parse_single_record_without_lab() {
        let json = r#"{"dogId": "max", "tests": [{"testType": "DM", "testDate": "2023-01-02", "result": "x"}]}"#;
        let records = JsonRecordParser::new().parse_reader(json.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tests[0].lab_name, "");
    }

    #[test]
    fn test_malformed_json() {
        let err = JsonRecordParser::new()
            .parse_reader("[{".as_bytes())
            .unwrap_err();
        assert!(matches!(err, GeneticsError::Json(_)));
    }
}
