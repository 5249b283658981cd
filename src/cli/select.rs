//! Select command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use super::utils::{parse_csv, parse_extensions, parse_languages};
use crate::config::{load_config, merge_cli_with_config, CliOverrides};
use crate::render::{render_core_files_jsonl, render_verdicts_jsonl, write_report, ReportOptions};
use crate::select::Selector;

#[derive(Args)]
pub struct SelectArgs {
    /// Directory to select from (defaults to the current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Path to config file (repo-core.toml or .repo-core.yml)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Include only these extensions (comma-separated, e.g., '.py,.rs')
    #[arg(short = 'i', long, value_name = "EXTS")]
    pub include_ext: Option<String>,

    /// Exclude paths matching these globs (comma-separated)
    #[arg(short = 'e', long, value_name = "GLOBS")]
    pub exclude_glob: Option<String>,

    /// Restrict selection to these languages (comma-separated, e.g., 'python,go')
    #[arg(short = 'l', long, value_name = "LANGS")]
    pub languages: Option<String>,

    /// Skip files larger than this (bytes)
    #[arg(long, value_name = "BYTES")]
    pub max_file_bytes: Option<u64>,

    /// Ignore .gitignore rules
    #[arg(long)]
    pub no_gitignore: bool,

    /// Follow symbolic links when scanning
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Include minified/bundled files
    #[arg(long)]
    pub include_minified: bool,

    /// Files scoring above this complexity are core
    #[arg(short = 't', long, value_name = "N")]
    pub threshold: Option<u32>,

    /// Combine rule: complexity, all, any, or an expression such as 'complexity and not coverage'
    #[arg(short = 'p', long, value_name = "RULE")]
    pub policy: Option<String>,

    /// Worker threads for static analysis (0 = all cores)
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Enable the dynamic coverage signal (executes python files in a sandbox)
    #[arg(long)]
    pub coverage: bool,

    /// Kill a coverage probe after this many milliseconds
    #[arg(long, value_name = "MS")]
    pub probe_timeout_ms: Option<u64>,

    /// Concurrent coverage probes
    #[arg(long, value_name = "N")]
    pub probe_workers: Option<usize>,

    /// Interpreter used for coverage probes
    #[arg(long, value_name = "PROGRAM")]
    pub python: Option<String>,

    /// Bubblewrap launcher that confines coverage probes
    #[arg(long, value_name = "PROGRAM")]
    pub sandbox: Option<String>,

    /// Enable the dependency fan-out signal
    #[arg(long)]
    pub fanout: bool,

    /// Files with more distinct references than this have high fan-out
    #[arg(long, value_name = "N")]
    pub fanout_threshold: Option<usize>,

    /// Output directory
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Omit the generation timestamp from report.json
    #[arg(long)]
    pub no_timestamp: bool,
}

pub fn run(args: SelectArgs) -> Result<()> {
    let started = Instant::now();
    let cwd = std::env::current_dir()?;
    let config_anchor = match args.path.as_ref() {
        Some(path) if path.exists() => path.canonicalize().unwrap_or_else(|_| cwd.clone()),
        _ => cwd.clone(),
    };

    let file_config = load_config(&config_anchor, args.config.as_deref())?;
    let cli_overrides = CliOverrides {
        path: args.path.clone(),
        include_extensions: parse_extensions(&args.include_ext)?,
        exclude_globs: parse_csv(&args.exclude_glob),
        max_file_bytes: args.max_file_bytes,
        respect_gitignore: if args.no_gitignore { Some(false) } else { None },
        follow_symlinks: if args.follow_symlinks { Some(true) } else { None },
        skip_minified: if args.include_minified { Some(false) } else { None },
        languages: parse_languages(&args.languages)?,
        complexity_threshold: args.threshold,
        policy: args.policy.clone(),
        workers: args.workers,
        coverage: if args.coverage { Some(true) } else { None },
        coverage_timeout_ms: args.probe_timeout_ms,
        coverage_workers: args.probe_workers,
        interpreter: args.python.clone(),
        sandbox: args.sandbox.clone(),
        fanout: if args.fanout { Some(true) } else { None },
        fanout_threshold: args.fanout_threshold,
        output_dir: args.output_dir.clone(),
        include_timestamp: if args.no_timestamp { Some(false) } else { None },
    };
    let merged = merge_cli_with_config(file_config, cli_overrides);

    let root = merged.path.clone().unwrap_or_else(|| PathBuf::from("."));
    if !root.is_dir() {
        anyhow::bail!("Path does not exist or is not a directory: {}", root.display());
    }

    let selector = Selector::new(merged.clone())?;
    let (selection, stats) = selector.select_root(&root)?;

    let output_dir = &merged.output_dir;
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed creating output directory: {}", output_dir.display()))?;

    let verdicts_path = output_dir.join("verdicts.jsonl");
    fs::write(&verdicts_path, render_verdicts_jsonl(&selection.verdicts))
        .with_context(|| format!("Failed writing {}", verdicts_path.display()))?;
    let core_path = output_dir.join("core_files.jsonl");
    fs::write(&core_path, render_core_files_jsonl(&selection.core_files))
        .with_context(|| format!("Failed writing {}", core_path.display()))?;

    let report_path = output_dir.join("report.json");
    let output_files = vec![
        verdicts_path.display().to_string(),
        core_path.display().to_string(),
        report_path.display().to_string(),
    ];
    let config_value = serde_json::to_value(&merged)?;
    let rule = selector.policy().rule.to_string();
    write_report(
        &report_path,
        &selection,
        &ReportOptions {
            root: Some(&root),
            stats: Some(&stats),
            config: &config_value,
            rule: &rule,
            output_files: &output_files,
            include_timestamp: merged.include_timestamp,
        },
    )?;

    tracing::debug!("select finished in {:.2?}", started.elapsed());
    println!("{}", selection.report.summary());
    if !selection.failures.is_empty() {
        println!("{} file(s) recorded soft failures; see {}", count_files(&selection), report_path.display());
    }
    println!("Wrote {}", output_dir.display());
    Ok(())
}

fn count_files(selection: &crate::select::Selection) -> usize {
    let mut paths: Vec<&str> = selection.failures.iter().map(|f| f.path.as_str()).collect();
    paths.sort_unstable();
    paths.dedup();
    paths.len()
}
