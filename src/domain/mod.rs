//! Core data types shared across the selector

mod config;
mod language;
mod signals;
mod source;

pub use config::{
    normalize_extensions, Config, CoverageConfig, FanoutConfig, DEFAULT_COMPLEXITY_THRESHOLD,
    DEFAULT_FANOUT_THRESHOLD, DEFAULT_PROBE_TIMEOUT_MS,
};
pub use language::{analyzable_languages, default_include_extensions, Language};
pub use signals::{
    CoverageReport, DependencyFanout, FailureKind, ReductionReport, SelectionVerdict,
    SignalValues, SoftFailure, UnitComplexity,
};
pub use source::{count_lines, SourceFile};

/// Version of the `report.json` layout.
pub const REPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Scan statistics for the discovery layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub files_scanned: usize,
    pub files_included: usize,
    pub files_skipped_size: usize,
    pub files_skipped_binary: usize,
    pub files_skipped_extension: usize,
    pub files_skipped_gitignore: usize,
    pub files_skipped_glob: usize,
    pub files_skipped_minified: usize,
    pub total_bytes_included: u64,
}

impl ScanStats {
    pub fn files_skipped(&self) -> usize {
        self.files_skipped_size
            + self.files_skipped_binary
            + self.files_skipped_extension
            + self.files_skipped_gitignore
            + self.files_skipped_glob
            + self.files_skipped_minified
    }

    pub fn to_report_value(&self) -> serde_json::Value {
        serde_json::json!({
            "files_scanned": self.files_scanned,
            "files_included": self.files_included,
            "files_skipped": {
                "size": self.files_skipped_size,
                "binary": self.files_skipped_binary,
                "extension": self.files_skipped_extension,
                "gitignore": self.files_skipped_gitignore,
                "glob": self.files_skipped_glob,
                "minified": self.files_skipped_minified,
            },
            "total_bytes_included": self.total_bytes_included,
        })
    }
}
