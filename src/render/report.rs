//! Report JSON generation.

use crate::domain::{ScanStats, REPORT_SCHEMA_VERSION};
use crate::select::Selection;
use anyhow::Result;
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::path::Path;

/// Run-level context that is not part of the selection itself.
pub struct ReportOptions<'a> {
    pub root: Option<&'a Path>,
    pub stats: Option<&'a ScanStats>,
    pub config: &'a Value,
    /// Combine rule as evaluated, e.g. `complexity and fanout`.
    pub rule: &'a str,
    pub output_files: &'a [String],
    pub include_timestamp: bool,
}

pub fn build_report(selection: &Selection, options: &ReportOptions<'_>) -> Result<Value> {
    let mut sorted_output_files = options.output_files.to_vec();
    sorted_output_files.sort();

    let mut report = Map::new();
    report.insert("schema_version".to_string(), Value::String(REPORT_SCHEMA_VERSION.to_string()));
    if options.include_timestamp {
        report.insert(
            "generated_at".to_string(),
            Value::String(Utc::now().format("%Y-%m-%dT%H:%M:%S+00:00").to_string()),
        );
    }
    if let Some(root) = options.root {
        report.insert("root".to_string(), Value::String(root.display().to_string()));
    }
    if let Some(stats) = options.stats {
        report.insert("stats".to_string(), stats.to_report_value());
    }
    report.insert("config".to_string(), options.config.clone());
    report.insert("rule".to_string(), Value::String(options.rule.to_string()));

    let r = &selection.report;
    report.insert(
        "reduction".to_string(),
        json!({
            "files_considered": r.files_considered,
            "files_retained": r.files_retained,
            "total_lines": r.total_lines,
            "retained_lines": r.retained_lines,
            "reduction_percent": round_percent(r.reduction_percent),
            "summary": r.summary(),
        }),
    );
    report.insert(
        "core_files".to_string(),
        Value::Array(selection.core_files.iter().map(|f| Value::String(f.path.clone())).collect()),
    );
    report.insert("verdicts".to_string(), serde_json::to_value(&selection.verdicts)?);
    if !selection.failures.is_empty() {
        report.insert("failures".to_string(), serde_json::to_value(&selection.failures)?);
    }
    report.insert("output_files".to_string(), serde_json::to_value(sorted_output_files)?);

    Ok(Value::Object(report))
}

pub fn write_report(report_path: &Path, selection: &Selection, options: &ReportOptions<'_>) -> Result<()> {
    let report = build_report(selection, options)?;
    if let Some(parent) = report_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(report_path, serde_json::to_string_pretty(&report)?)?;
    Ok(())
}

fn round_percent(percent: f64) -> f64 {
    (percent * 100.0).round() / 100.0
}
