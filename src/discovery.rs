use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::parsers::detect_format;

/// Finds importable dog record files (CSV, TSV, JSON, optionally gzipped)
pub struct FileDiscovery {
    recursive: bool,
}

impl FileDiscovery {
    pub fn new(recursive: bool) -> Self {
        Self { recursive }
    }

    /// Expand the given files and directories into record files
    pub fn discover(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for path in paths {
            if path.is_file() {
                files.push(path.clone());
            } else if path.is_dir() {
                files.extend(self.discover_in_directory(path)?);
            } else {
                warn!("Skipping missing path {}", path.display());
            }
        }

        // Remove duplicates while preserving order
        let mut seen = HashSet::new();
        files.retain(|path| seen.insert(path.clone()));

        Ok(files
            .into_iter()
            .filter(|path| is_record_file(path))
            .collect())
    }

    fn discover_in_directory(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        if self.recursive {
            for entry in WalkDir::new(dir)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let path = entry.path();
                if path.is_file() && is_record_file(path) {
                    files.push(path.to_path_buf());
                }
            }
        } else {
            let entries = fs::read_dir(dir)
                .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

            for entry in entries {
                let entry = entry.with_context(|| {
                    format!("Failed to read directory entry in: {}", dir.display())
                })?;
                let path = entry.path();

                if path.is_file() && is_record_file(&path) {
                    files.push(path);
                }
            }
            files.sort();
        }

        Ok(files)
    }
}

fn is_record_file(path: &Path) -> bool {
    detect_format(path).is_record_format()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_file_discovery() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let dir_path = temp_dir.path();

        let csv_path = dir_path.join("dogs.csv");
        let mut csv_file = File::create(&csv_path)?;
        writeln!(csv_file, "dog_id,test_type,test_date,result")?;
        writeln!(csv_file, "rex,DM,2023-01-01,Clear (N/N)")?;

        let json_path = dir_path.join("litter.json");
        fs::write(&json_path, "[]")?;

        let notes_path = dir_path.join("notes.md");
        fs::write(&notes_path, "not records")?;

        let nested = dir_path.join("archive");
        fs::create_dir(&nested)?;
        let nested_path = nested.join("old.tsv");
        fs::write(&nested_path, "dog_id\n")?;

        let flat = FileDiscovery::new(false).discover(&[dir_path.to_path_buf()])?;
        assert_eq!(flat, vec![csv_path.clone(), json_path.clone()]);

        let deep = FileDiscovery::new(true).discover(&[dir_path.to_path_buf(), csv_path.clone()])?;
        assert_eq!(deep.len(), 3);
        assert!(deep.contains(&nested_path));
        assert!(!deep.contains(&notes_path));

        Ok(())
    }

    #[test]
    fn test_missing_path_is_skipped() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let csv_path = temp_dir.path().join("dogs.csv");
        fs::write(&csv_path, "dog_id\n")?;

        let found = FileDiscovery::new(false)
            .discover(&[temp_dir.path().join("gone.csv"), csv_path.clone()])?;
        assert_eq!(found, vec![csv_path]);

        Ok(())
    }
}
