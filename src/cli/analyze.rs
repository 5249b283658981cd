//! Analyze command implementation

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

use crate::analysis::{ComplexityAnalyzer, CoverageProbe, FanoutAnalyzer, PythonTraceProbe, TreeIndex};
use crate::config::load_config;
use crate::domain::SourceFile;
use crate::scan::scan_sources;
use crate::utils::{normalize_path, read_source};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Source file to analyze
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Path to config file (repo-core.toml or .repo-core.yml)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also run the coverage probe (executes the file in a sandbox)
    #[arg(long)]
    pub coverage: bool,

    /// Kill the coverage probe after this many milliseconds
    #[arg(long, value_name = "MS")]
    pub probe_timeout_ms: Option<u64>,

    /// Resolve references against the tree under DIR and report fan-out
    #[arg(long, value_name = "DIR")]
    pub fanout_root: Option<PathBuf>,
}

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let mut config = load_config(&cwd, args.config.as_deref())?;
    if let Some(timeout) = args.probe_timeout_ms {
        config.coverage.timeout_ms = timeout;
    }

    let (content, _) = read_source(&args.file)?;
    let relative = match args.fanout_root.as_deref() {
        Some(root) => relative_to(root, &args.file)?,
        None => normalize_path(&args.file.to_string_lossy()),
    };
    let file = SourceFile::new(relative, content);

    let mut out = Map::new();
    out.insert("path".into(), json!(file.path));
    out.insert("language".into(), json!(file.language));
    out.insert("lines".into(), json!(file.line_count));
    out.insert("digest".into(), json!(file.digest()));

    match ComplexityAnalyzer::new().analyze(&file) {
        Ok(score) => {
            out.insert("complexity".into(), json!(score.total));
            out.insert("above_threshold".into(), json!(score.total > config.complexity_threshold));
            out.insert("units".into(), serde_json::to_value(&score.units)?);
        }
        Err(e) => {
            out.insert("complexity".into(), json!(0));
            out.insert("parse_failure".into(), json!(e.to_string()));
        }
    }

    if args.coverage {
        let coverage = match PythonTraceProbe::new(&config.coverage).probe(&file) {
            Ok(report) => json!({
                "fully_covered": report.fully_covered(),
                "executable": report.executable.len(),
                "unreached": report.unreached(),
            }),
            Err(e) => json!({ "fully_covered": false, "probe_failure": e.to_string() }),
        };
        out.insert("coverage".into(), coverage);
    }

    if let Some(root) = args.fanout_root.as_deref() {
        let (outcome, _) = scan_sources(root, &config)?;
        let index = TreeIndex::from_files(&outcome.files);
        let fanout = FanoutAnalyzer::new(&index).analyze(&file);
        out.insert(
            "fanout".into(),
            json!({
                "count": fanout.count(),
                "above_threshold": fanout.count() > config.fanout.threshold,
                "resolved": fanout.resolved,
                "external": fanout.external,
                "unresolved": fanout.unresolved,
            }),
        );
    }

    println!("{}", serde_json::to_string_pretty(&Value::Object(out))?);
    Ok(())
}

fn relative_to(root: &Path, file: &Path) -> Result<String> {
    let root = root
        .canonicalize()
        .with_context(|| format!("Fan-out root not found: {}", root.display()))?;
    let file = file
        .canonicalize()
        .with_context(|| format!("File not found: {}", file.display()))?;
    let relative = file.strip_prefix(&root).with_context(|| {
        format!("{} is not inside {}", file.display(), root.display())
    })?;
    Ok(normalize_path(&relative.to_string_lossy()))
}
