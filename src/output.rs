use anyhow::{Context, Result};
use chrono::Local;
use csv::WriterBuilder;
use serde_json::to_string_pretty;
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::*;

/// Supported report formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Html,
    Csv,
    Json,
    Tsv,
    All,
}

/// Report generator for pairing results
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl ReportGenerator {
    pub fn new(output_dir: &Path) -> Result<Self> {
        if !output_dir.exists() {
            fs::create_dir_all(output_dir).with_context(|| {
                format!("Failed to create output directory {}", output_dir.display())
            })?;
        }

        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Generate reports in the given format(s), returning the written paths
    pub fn generate(&self, results: &[PairingResult], format: ReportFormat) -> Result<Vec<PathBuf>> {
        let timestamp = self.report_stem(format);

        let written = match format {
            ReportFormat::Html => vec![self.generate_html_report(results, &timestamp)?],
            ReportFormat::Csv => vec![self.generate_delimited_report(results, &timestamp, b',')?],
            ReportFormat::Json => vec![self.generate_json_report(results, &timestamp)?],
            ReportFormat::Tsv => vec![self.generate_delimited_report(results, &timestamp, b'\t')?],
            ReportFormat::All => vec![
                self.generate_html_report(results, &timestamp)?,
                self.generate_delimited_report(results, &timestamp, b',')?,
                self.generate_json_report(results, &timestamp)?,
                self.generate_delimited_report(results, &timestamp, b'\t')?,
            ],
        };

        Ok(written)
    }

    fn report_path(&self, timestamp: &str, extension: &str) -> PathBuf {
        self.output_dir
            .join(format!("pairings_{}.{}", timestamp, extension))
    }

    /// Millisecond timestamp, suffixed with a counter if a report of this
    /// run would overwrite an existing file
    fn report_stem(&self, format: ReportFormat) -> String {
        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S%.3f").to_string();
        let extensions: &[&str] = match format {
            ReportFormat::Html => &["html"],
            ReportFormat::Csv => &["csv"],
            ReportFormat::Json => &["json"],
            ReportFormat::Tsv => &["tsv"],
            ReportFormat::All => &["html", "csv", "json", "tsv"],
        };
        let taken = |stem: &str| {
            extensions
                .iter()
                .any(|ext| self.report_path(stem, ext).exists())
        };

        let mut stem = timestamp.clone();
        let mut counter = 1;
        while taken(stem.as_str()) {
            stem = format!("{}_{}", timestamp, counter);
            counter += 1;
        }
        stem
    }

    fn generate_html_report(&self, results: &[PairingResult], timestamp: &str) -> Result<PathBuf> {
        let filename = self.report_path(timestamp, "html");

        fs::write(&filename, create_html_content(results))
            .with_context(|| format!("Failed to write HTML report to {}", filename.display()))?;

        Ok(filename)
    }

    fn generate_json_report(&self, results: &[PairingResult], timestamp: &str) -> Result<PathBuf> {
        let filename = self.report_path(timestamp, "json");

        let json_content =
            to_string_pretty(results).with_context(|| "Failed to serialize results to JSON")?;
        fs::write(&filename, json_content)
            .with_context(|| format!("Failed to write JSON report to {}", filename.display()))?;

        Ok(filename)
    }

    fn generate_delimited_report(
        &self,
        results: &[PairingResult],
        timestamp: &str,
        delimiter: u8,
    ) -> Result<PathBuf> {
        let extension = if delimiter == b'\t' { "tsv" } else { "csv" };
        let filename = self.report_path(timestamp, extension);

        let mut wtr = WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(&filename)
            .with_context(|| format!("Failed to create writer for {}", filename.display()))?;

        wtr.write_record([
            "sire_id",
            "dam_id",
            "compatibility_score",
            "is_compatible",
            "matched_traits",
            "conflicting_traits",
            "potential_colors",
            "health_risks",
        ])?;

        for result in results {
            let colors: Vec<&str> = result.potential_colors.iter().map(String::as_str).collect();
            wtr.write_record([
                &result.sire_id,
                &result.dam_id,
                &result.compatibility_score.to_string(),
                &result.is_compatible.to_string(),
                &result.matched_traits.join("; "),
                &result.conflicting_traits.join("; "),
                &colors.join("; "),
                &result.health_risks.join("; "),
            ])?;
        }

        wtr.flush()?;
        Ok(filename)
    }
}

fn create_html_content(results: &[PairingResult]) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Pairing Compatibility Report</title>
    <style>
        body {{
            font-family: Arial, sans-serif;
            margin: 40px;
            background-color: #f5f5f5;
        }}
        .container {{
            max-width: 1200px;
            margin: 0 auto;
            background-color: white;
            padding: 30px;
            border-radius: 10px;
            box-shadow: 0 0 10px rgba(0,0,0,0.1);
        }}
        h1, h2 {{
            color: #2c3e50;
        }}
        table {{
            width: 100%;
            border-collapse: collapse;
            margin: 20px 0;
        }}
        th, td {{
            border: 1px solid #ddd;
            padding: 12px;
            text-align: left;
            vertical-align: top;
        }}
        th {{
            background-color: #3498db;
            color: white;
        }}
        .compatibility-high {{
            background-color: #d4edda;
        }}
        .compatibility-medium {{
            background-color: #fff3cd;
        }}
        .compatibility-low {{
            background-color: #f8d7da;
        }}
        .note {{
            color: #7f8c8d;
            font-size: 0.9em;
        }}
    </style>
</head>
<body>
    <div class="container">
        <h1>Pairing Compatibility Report</h1>
        <p>Generated on: {}</p>
        <p class="note">Estimates are illustrative and not a substitute for veterinary advice.</p>
        {}
    </div>
</body>
</html>"#,
        timestamp,
        generate_pairings_html(results)
    )
}

fn generate_pairings_html(results: &[PairingResult]) -> String {
    if results.is_empty() {
        return "<h2>Pairings</h2><p>No results available.</p>".to_string();
    }

    let mut html = "<h2>Pairings</h2>\n<table>\n<tr><th>Sire</th><th>Dam</th><th>Score</th><th>Matched</th><th>Conflicting</th><th>Potential Colors</th><th>Health Risks</th></tr>\n".to_string();

    for result in results {
        let status_class = if result.compatibility_score > 80 {
            "compatibility-high"
        } else if result.compatibility_score > 50 {
            "compatibility-medium"
        } else {
            "compatibility-low"
        };
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}%</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            status_class,
            escape_html(&result.sire_id),
            escape_html(&result.dam_id),
            result.compatibility_score,
            join_escaped(&result.matched_traits, "<br>"),
            join_escaped(&result.conflicting_traits, "<br>"),
            join_escaped(&result.potential_colors, ", "),
            join_escaped(&result.health_risks, "<br>"),
        ));
    }

    html.push_str("</table>\n");
    html
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn join_escaped<'a>(items: impl IntoIterator<Item = &'a String>, separator: &str) -> String {
    items
        .into_iter()
        .map(|item| escape_html(item))
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Vec<PairingResult> {
        vec![PairingResult {
            sire_id: "rex".to_string(),
            dam_id: "bella".to_string(),
            compatibility_score: 50,
            matched_traits: vec!["Dilution: D/d".to_string()],
            conflicting_traits: vec!["Base Color: Sire E/E, Dam E/e".to_string()],
            potential_colors: ["E/E", "E/e"].iter().map(|s| s.to_string()).collect(),
            is_compatible: true,
            health_risks: vec!["Both parents are carriers for DM".to_string()],
        }]
    }

    #[test]
    fn test_generate_all_formats() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let generator = ReportGenerator::new(&temp_dir.path().join("reports"))?;

        let written = generator.generate(&sample(), ReportFormat::All)?;
        assert_eq!(written.len(), 4);
        for path in &written {
            assert!(path.exists(), "{} missing", path.display());
        }

        let json = fs::read_to_string(&written[2])?;
        let parsed: Vec<PairingResult> = serde_json::from_str(&json)?;
        assert_eq!(parsed, sample());
        assert!(json.contains("\"compatibilityScore\": 50"));

        let tsv = fs::read_to_string(&written[3])?;
        assert!(tsv.starts_with("sire_id\tdam_id\t"));
        assert!(tsv.contains("rex\tbella\t50\ttrue"));

        Ok(())
    }

    #[test]
    fn test_repeated_runs_do_not_overwrite() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let generator = ReportGenerator::new(temp_dir.path())?;

        let first = generator.generate(&sample(), ReportFormat::Csv)?;
        let second = generator.generate(&[], ReportFormat::Csv)?;

        assert_ne!(first, second);
        assert!(fs::read_to_string(&first[0])?.contains("rex,bella,50"));
        assert_eq!(fs::read_dir(temp_dir.path())?.count(), 2);

        Ok(())
    }

    #[test]
    fn test_html_escapes_values() {
        let mut results = sample();
        results[0].sire_id = "<script>".to_string();
        let html = create_html_content(&results);
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("compatibility-low"));
    }
}
