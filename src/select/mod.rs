//! Core-set selection over a file tree.
//!
//! Every eligible file is scored independently, the policy turns its signal
//! values into a verdict, and the reduction report is computed once all
//! verdicts are in. Per-file failures degrade signals and never abort a run.

pub mod policy;

pub use policy::{CombineRule, SelectionPolicy, Signal};

use crate::analysis::{
    ComplexityAnalyzer, CoverageProbe, FanoutAnalyzer, PythonTraceProbe, TreeIndex,
};
use crate::domain::{
    Config, DependencyFanout, FailureKind, Language, ReductionReport, ScanStats,
    SelectionVerdict, SignalValues, SoftFailure, SourceFile,
};
use crate::error::{ParseFailure, ProbeFailure, SelectError};
use crate::scan::scan_sources;
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A file kept in the core set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoreFile {
    pub path: String,
    pub language: Language,
    pub line_count: usize,
    pub content: String,
}

impl From<&SourceFile> for CoreFile {
    fn from(file: &SourceFile) -> Self {
        Self {
            path: file.path.clone(),
            language: file.language,
            line_count: file.line_count,
            content: file.content.clone(),
        }
    }
}

/// Result of one selection run.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Core files in input order.
    pub core_files: Vec<CoreFile>,
    pub report: ReductionReport,
    /// One verdict per eligible file, in input order.
    pub verdicts: Vec<SelectionVerdict>,
    pub failures: Vec<SoftFailure>,
}

/// Select the core files of `files` with a default [`Selector`].
pub fn select(files: &[SourceFile], config: &Config) -> Result<Selection, SelectError> {
    Selector::new(config.clone())?.select(files)
}

struct FileAnalysis {
    complexity: Result<u32, ParseFailure>,
    fanout: Option<DependencyFanout>,
}

/// Configured selection pipeline.
///
/// Construction validates the policy, so a bad rule fails before any file is
/// read.
pub struct Selector {
    config: Config,
    policy: SelectionPolicy,
    complexity: ComplexityAnalyzer,
    probe: Arc<dyn CoverageProbe>,
}

impl Selector {
    pub fn new(config: Config) -> Result<Self, SelectError> {
        let policy = SelectionPolicy::from_config(&config)?;
        let probe = Arc::new(PythonTraceProbe::new(&config.coverage));
        Ok(Self { config, policy, complexity: ComplexityAnalyzer::new(), probe })
    }

    pub fn with_complexity_analyzer(mut self, analyzer: ComplexityAnalyzer) -> Self {
        self.complexity = analyzer;
        self
    }

    pub fn with_coverage_probe(mut self, probe: impl CoverageProbe + 'static) -> Self {
        self.probe = Arc::new(probe);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    /// Scan `root` and select over what was found.
    ///
    /// Unreadable files are recorded as `io` failures and left out.
    pub fn select_root(&self, root: &Path) -> Result<(Selection, ScanStats), SelectError> {
        let (outcome, stats) = scan_sources(root, &self.config)
            .map_err(|e| SelectError::Config(format!("{:#}", e)))?;
        for failure in &outcome.failures {
            warn!("{} failure for {}: {}", failure.kind, failure.path, failure.detail);
        }
        let mut selection = self.select(&outcome.files)?;
        let mut failures = outcome.failures;
        failures.append(&mut selection.failures);
        selection.failures = failures;
        Ok((selection, stats))
    }

    pub fn select(&self, files: &[SourceFile]) -> Result<Selection, SelectError> {
        let started = Instant::now();
        let eligible: Vec<&SourceFile> =
            files.iter().filter(|f| self.config.is_eligible(f.language)).collect();
        let total_lines: usize = eligible.iter().map(|f| f.line_count).sum();
        if total_lines == 0 {
            return Err(SelectError::EmptyCorpus);
        }
        debug!(
            files = files.len(),
            eligible = eligible.len(),
            total_lines,
            rule = %self.policy.rule,
            "starting selection"
        );

        let analyses = self.analyze_static(files, &eligible)?;
        let coverage = self.probe_coverage(&eligible, &analyses)?;

        let mut verdicts = Vec::with_capacity(eligible.len());
        let mut core_files = Vec::new();
        let mut failures = Vec::new();
        let mut retained_lines = 0usize;

        for ((file, analysis), probed) in eligible.iter().zip(analyses).zip(coverage) {
            let mut file_failures = Vec::new();

            let (complexity, parse_failed) = match analysis.complexity {
                Ok(total) => (total, false),
                Err(e) => {
                    warn!("Parse failure for {}: {}", file.path, e);
                    file_failures.push(SoftFailure::new(&file.path, FailureKind::Parse, e.to_string()));
                    (0, true)
                }
            };

            let fully_covered = probed.map(|result| match result {
                Ok(covered) => covered,
                Err(e) => {
                    if matches!(e, ProbeFailure::UnsupportedLanguage(_)) {
                        debug!("Coverage skipped for {}: {}", file.path, e);
                    } else {
                        warn!("Probe failure for {}: {}", file.path, e);
                    }
                    file_failures.push(SoftFailure::new(&file.path, FailureKind::Probe, e.to_string()));
                    false
                }
            });

            let signals = SignalValues {
                complexity,
                fully_covered,
                fanout: analysis.fanout.as_ref().map(DependencyFanout::count),
            };
            let is_core = self.policy.is_core(&signals, parse_failed);
            if is_core {
                retained_lines += file.line_count;
                core_files.push(CoreFile::from(*file));
            }

            failures.extend(file_failures.iter().cloned());
            verdicts.push(SelectionVerdict {
                path: file.path.clone(),
                digest: file.digest(),
                line_count: file.line_count,
                is_core,
                signals,
                failures: file_failures,
            });
        }

        let report = ReductionReport::from_counts(
            eligible.len(),
            core_files.len(),
            total_lines,
            retained_lines,
        )
        .ok_or(SelectError::EmptyCorpus)?;

        info!(
            retained = core_files.len(),
            considered = eligible.len(),
            soft_failures = failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "{}",
            report.summary()
        );

        Ok(Selection { core_files, report, verdicts, failures })
    }

    /// Complexity and fan-out for every eligible file on the CPU pool.
    fn analyze_static(
        &self,
        files: &[SourceFile],
        eligible: &[&SourceFile],
    ) -> Result<Vec<FileAnalysis>, SelectError> {
        let index = self.config.fanout.enabled.then(|| TreeIndex::from_files(files));
        let fanout = index.as_ref().map(FanoutAnalyzer::new);
        let pool = build_pool(self.config.workers)?;

        Ok(pool.install(|| {
            eligible
                .par_iter()
                .map(|file| FileAnalysis {
                    complexity: self.complexity.analyze(file).map(|score| score.total),
                    fanout: fanout.as_ref().map(|analyzer| analyzer.analyze(file)),
                })
                .collect()
        }))
    }

    /// Coverage on its own bounded pool; `None` per file when disabled.
    ///
    /// Files that failed to parse are peripheral regardless and are not run.
    fn probe_coverage(
        &self,
        eligible: &[&SourceFile],
        analyses: &[FileAnalysis],
    ) -> Result<Vec<Option<Result<bool, ProbeFailure>>>, SelectError> {
        if !self.config.coverage.enabled {
            return Ok(eligible.iter().map(|_| None).collect());
        }
        let pool = build_pool(self.config.coverage.workers.max(1))?;
        let probe = Arc::clone(&self.probe);

        Ok(pool.install(|| {
            eligible
                .par_iter()
                .zip(analyses.par_iter())
                .map(|(file, analysis)| {
                    if analysis.complexity.is_err() {
                        return Some(Ok(false));
                    }
                    Some(probe.probe(file).map(|report| report.fully_covered()))
                })
                .collect()
        }))
    }
}

fn build_pool(workers: usize) -> Result<ThreadPool, SelectError> {
    Ok(rayon::ThreadPoolBuilder::new().num_threads(workers).build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::UnitParser;
    use crate::domain::{CoverageReport, UnitComplexity};
    use std::collections::HashMap;

    /// Scores a file by looking its content up in a fixed table.
    struct TableParser(HashMap<String, u32>);

    impl UnitParser for TableParser {
        fn parse_units(&self, content: &str) -> Result<Vec<UnitComplexity>, ParseFailure> {
            match self.0.get(content.lines().next().unwrap_or("")) {
                Some(&complexity) => {
                    Ok(vec![UnitComplexity { name: "f".into(), start_line: 1, complexity }])
                }
                None => Err(ParseFailure::Syntax { line: 1 }),
            }
        }
    }

    struct FixedProbe(bool);

    impl CoverageProbe for FixedProbe {
        fn probe(&self, _file: &SourceFile) -> Result<CoverageReport, ProbeFailure> {
            let reached = if self.0 { [1].into_iter().collect() } else { Default::default() };
            Ok(CoverageReport { executable: [1].into_iter().collect(), reached })
        }
    }

    fn file(name: &str, tag: &str, lines: usize) -> SourceFile {
        let mut content = format!("{}\n", tag);
        for _ in 1..lines {
            content.push_str("x = 1\n");
        }
        SourceFile::new(name, content)
    }

    fn selector(config: Config, scores: &[(&str, u32)]) -> Selector {
        let table = scores.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        let analyzer = ComplexityAnalyzer::new().with_parser(Language::Python, TableParser(table));
        Selector::new(config).unwrap().with_complexity_analyzer(analyzer)
    }

    #[test]
    fn threshold_selects_strictly_greater() {
        let files = vec![file("a.py", "#a", 10), file("b.py", "#b", 10), file("c.py", "#c", 10)];
        let sel = selector(Config::default(), &[("#a", 10), ("#b", 30), ("#c", 25)])
            .select(&files)
            .unwrap();

        let core: Vec<&str> = sel.core_files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(core, vec!["b.py"]);
        assert_eq!(sel.verdicts.len(), 3);
        assert_eq!(sel.verdicts[2].signals.complexity, 25);
        assert!(!sel.verdicts[2].is_core);
    }

    #[test]
    fn reduction_uses_retained_over_total_lines() {
        let files = vec![file("core.py", "#hot", 400), file("rest.py", "#cold", 600)];
        let sel = selector(Config::default(), &[("#hot", 40), ("#cold", 1)]).select(&files).unwrap();
        assert_eq!(sel.report.total_lines, 1000);
        assert_eq!(sel.report.retained_lines, 400);
        assert_eq!(format!("{:.2}", sel.report.reduction_percent), "60.00");
    }

    #[test]
    fn empty_input_is_empty_corpus() {
        let err = select(&[], &Config::default()).unwrap_err();
        assert!(matches!(err, SelectError::EmptyCorpus));

        let blank = vec![SourceFile::new("a.py", ""), SourceFile::new("README.md", "# hi\n")];
        assert!(matches!(select(&blank, &Config::default()), Err(SelectError::EmptyCorpus)));
    }

    #[test]
    fn parse_failure_is_peripheral_and_recorded() {
        let files = vec![file("ok.py", "#ok", 5), file("bad.py", "#unknown", 5)];
        let mut config = Config::default();
        config.policy = "not complexity".into();
        let sel = selector(config, &[("#ok", 1)]).select(&files).unwrap();

        assert_eq!(sel.core_files.len(), 1);
        assert_eq!(sel.core_files[0].path, "ok.py");
        assert!(sel.verdicts[1].has_failure(FailureKind::Parse));
        assert_eq!(sel.verdicts[1].signals.complexity, 0);
        assert_eq!(sel.failures.len(), 1);
    }

    #[test]
    fn ineligible_languages_are_not_considered() {
        let files = vec![file("a.py", "#a", 3), SourceFile::new("notes.md", "# notes\n\nmore\n")];
        let sel = selector(Config::default(), &[("#a", 50)]).select(&files).unwrap();
        assert_eq!(sel.verdicts.len(), 1);
        assert_eq!(sel.report.files_considered, 1);
        assert_eq!(sel.report.reduction_percent, 0.0);
    }

    #[test]
    fn coverage_signal_combines_with_complexity() {
        let files = vec![file("a.py", "#a", 3), file("b.py", "#b", 3)];
        let mut config = Config::default();
        config.coverage.enabled = true;
        config.policy = "complexity and coverage".into();

        let covered = selector(config.clone(), &[("#a", 30), ("#b", 1)])
            .with_coverage_probe(FixedProbe(true))
            .select(&files)
            .unwrap();
        assert_eq!(covered.core_files.len(), 1);
        assert_eq!(covered.verdicts[0].signals.fully_covered, Some(true));

        let uncovered = selector(config, &[("#a", 30), ("#b", 1)])
            .with_coverage_probe(FixedProbe(false))
            .select(&files)
            .unwrap();
        assert!(uncovered.core_files.is_empty());
        assert_eq!(uncovered.report.reduction_percent, 100.0);
    }

    /// Times out on one path and fully covers every other file.
    struct StallingProbe(&'static str);

    impl CoverageProbe for StallingProbe {
        fn probe(&self, file: &SourceFile) -> Result<CoverageReport, ProbeFailure> {
            if file.path == self.0 {
                return Err(ProbeFailure::Timeout(std::time::Duration::from_millis(300)));
            }
            FixedProbe(true).probe(file)
        }
    }

    #[test]
    fn failed_coverage_run_degrades_to_uncovered_and_batch_continues() {
        let files = vec![file("stuck.py", "#a", 4), file("fine.py", "#b", 6)];
        let mut config = Config::default();
        config.coverage.enabled = true;
        config.policy = "complexity and coverage".into();

        let sel = selector(config, &[("#a", 30), ("#b", 30)])
            .with_coverage_probe(StallingProbe("stuck.py"))
            .select(&files)
            .unwrap();

        let stuck = &sel.verdicts[0];
        assert_eq!(stuck.signals.fully_covered, Some(false));
        assert!(stuck.has_failure(FailureKind::Probe));
        assert!(!stuck.is_core);
        assert_eq!(sel.failures.len(), 1);
        assert_eq!(sel.failures[0].path, "stuck.py");
        assert_eq!(sel.failures[0].kind, FailureKind::Probe);
        assert!(sel.failures[0].detail.contains("timed out"));

        assert_eq!(sel.verdicts[1].signals.fully_covered, Some(true));
        let core: Vec<&str> = sel.core_files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(core, vec!["fine.py"]);
        assert_eq!(sel.report.retained_lines, 6);
    }

    #[test]
    fn fanout_signal_uses_whole_tree() {
        let mut config = Config::default();
        config.fanout.enabled = true;
        config.fanout.threshold = 1;
        config.policy = "complexity or fanout".into();
        let files = vec![
            SourceFile::new("app.py", "import os\nimport json\nfrom lib import helper\n"),
            SourceFile::new("lib/helper.py", "def helper():\n    return 1\n"),
        ];
        let sel = select(&files, &config).unwrap();
        assert_eq!(sel.verdicts[0].signals.fanout, Some(3));
        assert!(sel.verdicts[0].is_core);
        assert_eq!(sel.verdicts[1].signals.fanout, Some(0));
        assert!(!sel.verdicts[1].is_core);
    }

    #[test]
    fn invalid_policy_fails_before_analysis() {
        let mut config = Config::default();
        config.policy = "complexity and fanout".into();
        assert!(matches!(Selector::new(config), Err(SelectError::Policy(_))));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let files = vec![file("a.py", "#a", 7), file("b.py", "#b", 3)];
        let s = selector(Config::default(), &[("#a", 26), ("#b", 2)]);
        let first = s.select(&files).unwrap();
        let second = s.select(&files).unwrap();
        assert_eq!(first.verdicts, second.verdicts);
        assert_eq!(first.report, second.report);
        assert_eq!(first.core_files, second.core_files);
    }

    #[test]
    fn select_root_records_scan_and_selection() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("busy.py"),
            "def f(x):\n".to_string() + &"    if x:\n        x -= 1\n".repeat(30),
        )
        .unwrap();
        std::fs::write(tmp.path().join("calm.py"), "def g():\n    return 1\n").unwrap();

        let (sel, stats) = Selector::new(Config::default()).unwrap().select_root(tmp.path()).unwrap();
        assert_eq!(stats.files_included, 2);
        let core: Vec<&str> = sel.core_files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(core, vec!["busy.py"]);
    }
}
