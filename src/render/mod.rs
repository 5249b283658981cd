//! Output rendering (report JSON, JSONL)

pub mod jsonl;
pub mod report;

pub use jsonl::{render_core_files_jsonl, render_verdicts_jsonl};
pub use report::{build_report, write_report, ReportOptions};
