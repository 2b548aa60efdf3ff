use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{GeneticsError, Result};
use crate::parsers::{open_file, push_test, RecordParser};
use crate::types::*;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];

/// CSV/TSV importer for per-test rows
/// (`dog_id, breed, test_type, test_date, result, lab_name`)
pub struct DelimitedParser {
    delimiter: u8,
}

impl DelimitedParser {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    pub fn parse_reader<R: std::io::Read>(&self, reader: R) -> Result<Vec<DogTestRecord>> {
        let mut csv_reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let column_mapping = self.map_columns(&headers)?;

        let mut records = Vec::new();
        for (i, row) in csv_reader.records().enumerate() {
            // Header is line 1
            self.parse_row(&row?, i + 2, &column_mapping, &mut records)?;
        }

        Ok(records)
    }

    fn map_columns(&self, headers: &StringRecord) -> Result<HashMap<&'static str, usize>> {
        let mut mapping = HashMap::new();

        for (i, header) in headers.iter().enumerate() {
            let header_lower = header.trim().to_lowercase().replace(&[' ', '-'][..], "_");

            match header_lower.as_str() {
                "dog_id" | "dogid" | "dog" | "id" => {
                    mapping.insert("dog_id", i);
                }
                "breed" => {
                    mapping.insert("breed", i);
                }
                "test_type" | "testtype" | "test" => {
                    mapping.insert("test_type", i);
                }
                "test_date" | "testdate" | "date" => {
                    mapping.insert("test_date", i);
                }
                "result" | "test_result" => {
                    mapping.insert("result", i);
                }
                "lab_name" | "labname" | "lab" => {
                    mapping.insert("lab_name", i);
                }
                _ => {}
            }
        }

        if !mapping.contains_key("dog_id") {
            return Err(GeneticsError::InvalidRecord {
                line: 1,
                reason: "required column dog_id not found".to_string(),
            });
        }

        Ok(mapping)
    }

    fn parse_row(
        &self,
        row: &StringRecord,
        line: usize,
        column_mapping: &HashMap<&'static str, usize>,
        records: &mut Vec<DogTestRecord>,
    ) -> Result<()> {
        let field = |name: &str| column_field(row, column_mapping, name);

        if row.iter().all(|value| value.is_empty()) {
            return Ok(());
        }

        let dog_id = field("dog_id").ok_or_else(|| GeneticsError::InvalidRecord {
            line,
            reason: "missing dog_id".to_string(),
        })?;
        let breed = field("breed").map(str::to_string);

        // A row with no test type only carries dog metadata
        let test = match field("test_type") {
            Some(test_type) => {
                let date_str = field("test_date").ok_or_else(|| GeneticsError::InvalidRecord {
                    line,
                    reason: format!("missing test_date for {}", test_type),
                })?;
                let test_date =
                    parse_date(date_str).ok_or_else(|| GeneticsError::InvalidRecord {
                        line,
                        reason: format!("invalid test_date: {}", date_str),
                    })?;

                Some(RawGeneticTest {
                    test_type: test_type.to_string(),
                    test_date,
                    result: field("result").unwrap_or_default().to_string(),
                    lab_name: field("lab_name").unwrap_or_default().to_string(),
                })
            }
            None => None,
        };

        push_test(records, dog_id, breed, test);
        Ok(())
    }
}

fn column_field<'a>(
    row: &'a StringRecord,
    column_mapping: &HashMap<&'static str, usize>,
    name: &str,
) -> Option<&'a str> {
    column_mapping
        .get(name)
        .and_then(|&idx| row.get(idx))
        .filter(|value| !value.is_empty())
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    // Accept full timestamps by keeping the date part
    let value = value.split(&['T', ' '][..]).next().unwrap_or(value);
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

impl RecordParser for DelimitedParser {
    fn parse(&self, path: &Path) -> Result<Vec<DogTestRecord>> {
        self.parse_reader(open_file(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Dog ID,Breed,Test Type,Test Date,Result,Lab Name
rex,Labrador Retriever,Color Panel,2023-05-01,\"E/e, B/b, D/d, a/a\",Embark
rex,,DM,2023-05-01,Clear (N/N),Embark
bella,Labrador Retriever,DM,2023-06-12T10:00:00Z,Carrier (N/m),Paw Print
rex,,EIC,2024-01-09,pending,Embark
";

    #[test]
    fn test_parse_csv_groups_by_dog() {
        let records = DelimitedParser::new(b',').parse_reader(CSV.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        let rex = &records[0];
        assert_eq!(rex.dog_id, "rex");
        assert_eq!(rex.breed.as_deref(), Some("Labrador Retriever"));
        assert_eq!(rex.tests.len(), 3);
        assert_eq!(rex.tests[0].result, "E/e, B/b, D/d, a/a");
        assert_eq!(rex.tests[2].result, "pending");

        let bella = &records[1];
        assert_eq!(
            bella.tests[0].test_date,
            NaiveDate::from_ymd_opt(2023, 6, 12).unwrap()
        );
        assert_eq!(bella.tests[0].lab_name, "Paw Print");
    }

    #[test]
    fn test_parse_tsv() {
        let tsv = "dog_id\ttest_type\ttest_date\tresult\nmax\tDM\t2022-02-02\tClear (N/N)\n";
        let records = DelimitedParser::new(b'\t').parse_reader(tsv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tests[0].lab_name, "");
    }

    #[test]
    fn test_missing_dog_id_column() {
        let err = DelimitedParser::new(b',')
            .parse_reader("name,result\nrex,Clear (N/N)\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, GeneticsError::InvalidRecord { line: 1, .. }));
    }

    #[test]
    fn test_invalid_date_reports_line() {
        let csv = "dog_id,test_type,test_date,result\nrex,DM,someday,Clear (N/N)\n";
        let err = DelimitedParser::new(b',').parse_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, GeneticsError::InvalidRecord { line: 2, .. }));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 7);
        assert_eq!(parse_date("2024-03-07"), expected);
        assert_eq!(parse_date("2024/03/07"), expected);
        assert_eq!(parse_date("07.03.2024"), expected);
        assert_eq!(parse_date("2024-03-07 12:00"), expected);
        assert_eq!(parse_date("March"), None);
    }
}
