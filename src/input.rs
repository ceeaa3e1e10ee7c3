//! Target list loading
//!
//! Targets come from a delimited text file with a header row and two
//! columns: `target` (host name or IP, required) and `ports`
//! (comma-separated, optional). Records with an empty host field are
//! skipped; unusable port tokens are dropped.

use crate::{
    error::{AppError, Result},
    models::Target,
};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Reads targets from a delimited source
pub struct TargetLoader {
    delimiter: u8,
}

impl TargetLoader {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Load all targets from a file on disk
    pub fn load_path(&self, path: &Path) -> Result<Vec<Target>> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => AppError::input(format!(
                "source not found: '{}' does not exist in {}",
                path.display(),
                std::env::current_dir()
                    .map(|d| d.display().to_string())
                    .unwrap_or_else(|_| "the working directory".to_string())
            )),
            _ => AppError::input(format!("cannot open '{}': {}", path.display(), e)),
        })?;
        self.load_reader(file)
    }

    /// Load targets from any reader; the first record is a header
    pub fn load_reader<R: Read>(&self, reader: R) -> Result<Vec<Target>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut targets = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let host = record.get(0).unwrap_or("");
            if let Some(target) = Target::from_fields(host, record.get(1)) {
                targets.push(target);
            }
        }
        Ok(targets)
    }
}

impl Default for TargetLoader {
    fn default() -> Self {
        Self::new(crate::defaults::DEFAULT_DELIMITER)
    }
}

/// Convenience function to load targets with the default delimiter
pub fn load_targets(path: &Path) -> Result<Vec<Target>> {
    TargetLoader::default().load_path(path)
}
