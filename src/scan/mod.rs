//! File scanning with gitignore support

use crate::domain::{Config, ScanStats};
use anyhow::Result;
use std::path::Path;

pub mod scanner;

pub use scanner::{FileScanner, ScanOutcome};

/// Scan `root` with the discovery settings from `config`.
pub fn scan_sources<P: AsRef<Path>>(root: P, config: &Config) -> Result<(ScanOutcome, ScanStats)> {
    let mut scanner = FileScanner::from_config(root.as_ref().to_path_buf(), config);
    let outcome = scanner.scan()?;
    let stats = scanner.stats().clone();
    Ok((outcome, stats))
}
