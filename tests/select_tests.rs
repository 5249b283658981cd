//! End-to-end selection over in-memory corpora

use repo_core::domain::FailureKind;
use repo_core::{select, Config, SelectError, SourceFile};
use similar_asserts::assert_eq;

/// A python file with one function of complexity `branches + 1`, padded to `lines` lines.
fn python_file(path: &str, branches: usize, lines: usize) -> SourceFile {
    let mut src = String::from("def handler(x):\n");
    for i in 0..branches {
        src.push_str(&format!("    if x == {}:\n        return {}\n", i, i));
    }
    src.push_str("    return -1\n");
    let used = 2 + branches * 2;
    assert!(used <= lines, "{} needs at least {} lines", path, used);
    for _ in used..lines {
        src.push_str("# padding\n");
    }
    SourceFile::new(path, src)
}

#[test]
fn one_core_file_removes_sixty_percent() {
    let files = vec![
        python_file("core/engine.py", 30, 400),
        python_file("util/a.py", 2, 300),
        python_file("util/b.py", 0, 300),
    ];
    let selection = select(&files, &Config::default()).unwrap();

    assert_eq!(selection.report.total_lines, 1000);
    assert_eq!(selection.report.retained_lines, 400);
    insta::assert_snapshot!(
        selection.report.summary(),
        @"Removed 60.00% of the code (400 of 1000 lines retained across 1 of 3 files)"
    );
    let core: Vec<&str> = selection.core_files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(core, vec!["core/engine.py"]);
}

#[test]
fn threshold_is_strictly_greater() {
    let files = vec![
        python_file("low.py", 9, 20),
        python_file("high.py", 29, 60),
        python_file("edge.py", 24, 50),
    ];
    let selection = select(&files, &Config::default()).unwrap();

    let verdicts: Vec<(&str, u32, bool)> = selection
        .verdicts
        .iter()
        .map(|v| (v.path.as_str(), v.signals.complexity, v.is_core))
        .collect();
    assert_eq!(verdicts, vec![("low.py", 10, false), ("high.py", 30, true), ("edge.py", 25, false)]);
}

#[test]
fn empty_corpus_is_an_error() {
    let err = select(&[], &Config::default()).unwrap_err();
    assert!(matches!(err, SelectError::EmptyCorpus));

    let blank = vec![SourceFile::new("empty.py", "")];
    assert!(matches!(select(&blank, &Config::default()), Err(SelectError::EmptyCorpus)));
}

#[test]
fn unparsable_file_is_peripheral_with_soft_failure() {
    let files = vec![
        SourceFile::new("broken.py", "def broken(:\n    pass\n"),
        python_file("fine.py", 30, 70),
    ];
    let selection = select(&files, &Config::default()).unwrap();

    let broken = &selection.verdicts[0];
    assert!(!broken.is_core);
    assert!(broken.has_failure(FailureKind::Parse));
    assert!(selection.failures.iter().any(|f| f.path == "broken.py" && f.kind == FailureKind::Parse));
    assert_eq!(selection.core_files.len(), 1);
    assert_eq!(selection.core_files[0].path, "fine.py");
}

#[test]
fn selection_is_deterministic() {
    let files = vec![
        python_file("a.py", 30, 80),
        python_file("b.py", 3, 20),
        SourceFile::new("c.rs", "fn main() {\n    if true { println!(\"x\"); }\n}\n"),
    ];
    let config = Config { workers: 4, ..Config::default() };
    let first = select(&files, &config).unwrap();
    let second = select(&files, &config).unwrap();

    assert_eq!(first.verdicts, second.verdicts);
    assert_eq!(first.report, second.report);
}

#[test]
fn raising_the_threshold_never_grows_the_core() {
    let files = vec![
        python_file("a.py", 30, 80),
        python_file("b.py", 12, 40),
        python_file("c.py", 5, 20),
    ];
    let mut previous = usize::MAX;
    for threshold in [0, 5, 10, 20, 40] {
        let config = Config { complexity_threshold: threshold, ..Config::default() };
        let retained = select(&files, &config).unwrap().report.retained_lines;
        assert!(retained <= previous, "threshold {} retained {}", threshold, retained);
        previous = retained;
    }
    assert_eq!(previous, 0);
}
