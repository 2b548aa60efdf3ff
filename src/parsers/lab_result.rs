use lazy_static::lazy_static;
use regex::Regex;

use crate::types::{Locus, MarkerStatus};

lazy_static! {
    /// `<status-word> (<genotype>)`, e.g. `Clear (N/N)`
    static ref MARKER_RESULT: Regex = Regex::new(r"^\s*(\w+)\s*\(([^()]+)\)\s*$").unwrap();
}

/// Classified free-text lab result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabResult {
    /// Locus assignments from a color panel, in token order
    ColorPanel(Vec<(Locus, String)>),
    Marker {
        status: MarkerStatus,
        genotype: String,
    },
    /// Result text in no recognised format
    Unparsed(String),
}

/// Classify a lab result. `color_panel_test` names the test type that carries
/// color-panel tokens; every other test type is read as a health marker.
pub fn parse_lab_result(test_type: &str, result: &str, color_panel_test: &str) -> LabResult {
    if is_color_panel(test_type, color_panel_test) {
        LabResult::ColorPanel(parse_color_panel(result))
    } else {
        parse_marker(result).unwrap_or_else(|| LabResult::Unparsed(result.to_string()))
    }
}

pub fn is_color_panel(test_type: &str, color_panel_test: &str) -> bool {
    test_type.trim().eq_ignore_ascii_case(color_panel_test.trim())
}

/// Split a color panel on `", "` and assign tokens to loci by first character.
/// Tokens for no known locus are dropped.
pub fn parse_color_panel(result: &str) -> Vec<(Locus, String)> {
    result
        .split(", ")
        .filter_map(|token| {
            let token = token.trim();
            Locus::from_token(token).map(|locus| (locus, token.to_string()))
        })
        .collect()
}

pub fn parse_marker(result: &str) -> Option<LabResult> {
    let caps = MARKER_RESULT.captures(result)?;
    Some(LabResult::Marker {
        status: MarkerStatus::from_status_word(&caps[1]),
        genotype: caps[2].trim().to_string(),
    })
}
