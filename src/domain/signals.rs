//! Per-file signal values, verdicts and the run-level reduction report

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Complexity of one function-like unit: `1 + decision points`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitComplexity {
    pub name: String,
    pub start_line: usize,
    pub complexity: u32,
}

/// Line-level reach of one probing run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub executable: BTreeSet<u32>,
    pub reached: BTreeSet<u32>,
}

impl CoverageReport {
    pub fn unreached(&self) -> BTreeSet<u32> {
        self.executable.difference(&self.reached).copied().collect()
    }

    pub fn fully_covered(&self) -> bool {
        self.executable.is_subset(&self.reached)
    }
}

/// Outgoing references of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyFanout {
    /// Paths of in-tree files or directories the file references.
    pub resolved: BTreeSet<String>,
    /// Library references that were counted but not traversed.
    pub external: BTreeSet<String>,
    /// Relative references that matched nothing in the tree.
    pub unresolved: Vec<String>,
}

impl DependencyFanout {
    pub fn count(&self) -> usize {
        self.resolved.len() + self.external.len()
    }
}

/// Signal values that produced a verdict. Optional signals are `None` when disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalValues {
    pub complexity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fully_covered: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fanout: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Parse,
    Probe,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Parse => "parse",
            Self::Probe => "probe",
            Self::Io => "io",
        };
        f.write_str(label)
    }
}

/// A per-file failure that degraded a signal to its conservative default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftFailure {
    pub path: String,
    pub kind: FailureKind,
    pub detail: String,
}

impl SoftFailure {
    pub fn new(path: impl Into<String>, kind: FailureKind, detail: impl Into<String>) -> Self {
        Self { path: path.into(), kind, detail: detail.into() }
    }
}

/// Auditable inclusion decision for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionVerdict {
    pub path: String,
    pub digest: String,
    pub line_count: usize,
    pub is_core: bool,
    pub signals: SignalValues,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<SoftFailure>,
}

impl SelectionVerdict {
    pub fn has_failure(&self, kind: FailureKind) -> bool {
        self.failures.iter().any(|f| f.kind == kind)
    }
}

/// How much of a corpus survived selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReductionReport {
    pub files_considered: usize,
    pub files_retained: usize,
    pub total_lines: usize,
    pub retained_lines: usize,
    pub reduction_percent: f64,
}

impl ReductionReport {
    /// Returns `None` when `total_lines` is zero.
    pub fn from_counts(
        files_considered: usize,
        files_retained: usize,
        total_lines: usize,
        retained_lines: usize,
    ) -> Option<Self> {
        if total_lines == 0 {
            return None;
        }
        let ratio = retained_lines.min(total_lines) as f64 / total_lines as f64;
        let reduction_percent = ((1.0 - ratio) * 100.0).clamp(0.0, 100.0);
        Some(Self { files_considered, files_retained, total_lines, retained_lines, reduction_percent })
    }

    pub fn summary(&self) -> String {
        format!(
            "Removed {:.2}% of the code ({} of {} lines retained across {} of {} files)",
            self.reduction_percent,
            self.retained_lines,
            self.total_lines,
            self.files_retained,
            self.files_considered
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduction_matches_retained_ratio() {
        let report = ReductionReport::from_counts(3, 1, 1000, 400).expect("non-empty");
        assert!((report.reduction_percent - 60.0).abs() < 1e-9);
        assert_eq!(format!("{:.2}", report.reduction_percent), "60.00");
    }

    #[test]
    fn reduction_is_bounded() {
        let all = ReductionReport::from_counts(2, 2, 50, 50).expect("non-empty");
        assert_eq!(all.reduction_percent, 0.0);
        let none = ReductionReport::from_counts(2, 0, 50, 0).expect("non-empty");
        assert_eq!(none.reduction_percent, 100.0);
    }

    #[test]
    fn zero_total_has_no_report() {
        assert!(ReductionReport::from_counts(0, 0, 0, 0).is_none());
    }

    #[test]
    fn empty_coverage_is_vacuously_full() {
        assert!(CoverageReport::default().fully_covered());
        let partial = CoverageReport {
            executable: [1, 2, 3].into_iter().collect(),
            reached: [1, 3].into_iter().collect(),
        };
        assert!(!partial.fully_covered());
        assert_eq!(partial.unreached().into_iter().collect::<Vec<_>>(), vec![2]);
    }
}
