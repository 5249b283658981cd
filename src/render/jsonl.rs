//! JSONL rendering of verdicts and core files

use crate::domain::SelectionVerdict;
use crate::select::CoreFile;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// One line per verdict, keys in alphabetical order.
pub fn render_verdicts_jsonl(verdicts: &[SelectionVerdict]) -> String {
    render_lines(verdicts.iter().map(|v| {
        let mut entry: BTreeMap<&str, Value> = BTreeMap::new();
        entry.insert("complexity", json!(v.signals.complexity));
        entry.insert("digest", json!(v.digest));
        entry.insert("is_core", json!(v.is_core));
        entry.insert("lines", json!(v.line_count));
        entry.insert("path", json!(v.path));
        if let Some(covered) = v.signals.fully_covered {
            entry.insert("fully_covered", json!(covered));
        }
        if let Some(fanout) = v.signals.fanout {
            entry.insert("fanout", json!(fanout));
        }
        if !v.failures.is_empty() {
            let failures: Vec<Value> = v
                .failures
                .iter()
                .map(|f| json!({ "detail": f.detail, "kind": f.kind }))
                .collect();
            entry.insert("failures", Value::Array(failures));
        }
        entry
    }))
}

/// One line per core file with its content, in selection order.
pub fn render_core_files_jsonl(files: &[CoreFile]) -> String {
    render_lines(files.iter().map(|f| {
        let mut entry: BTreeMap<&str, Value> = BTreeMap::new();
        entry.insert("content", json!(f.content));
        entry.insert("lang", json!(f.language));
        entry.insert("lines", json!(f.line_count));
        entry.insert("path", json!(f.path));
        entry
    }))
}

fn render_lines<'a>(entries: impl Iterator<Item = BTreeMap<&'a str, Value>>) -> String {
    let lines: Vec<String> = entries.filter_map(|entry| serde_json::to_string(&entry).ok()).collect();
    if lines.is_empty() {
        String::new()
    } else {
        format!("{}\n", lines.join("\n"))
    }
}
