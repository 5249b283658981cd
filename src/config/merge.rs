//! CLI overrides on top of the loaded configuration

use crate::domain::{Config, Language};
use std::path::PathBuf;

/// Values given on the command line. `None` leaves the configured value alone.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub path: Option<PathBuf>,
    pub include_extensions: Option<Vec<String>>,
    pub exclude_globs: Option<Vec<String>>,
    pub max_file_bytes: Option<u64>,
    pub respect_gitignore: Option<bool>,
    pub follow_symlinks: Option<bool>,
    pub skip_minified: Option<bool>,
    pub languages: Option<Vec<Language>>,
    pub complexity_threshold: Option<u32>,
    pub policy: Option<String>,
    pub workers: Option<usize>,
    pub coverage: Option<bool>,
    pub coverage_timeout_ms: Option<u64>,
    pub coverage_workers: Option<usize>,
    pub interpreter: Option<String>,
    pub sandbox: Option<String>,
    pub fanout: Option<bool>,
    pub fanout_threshold: Option<usize>,
    pub output_dir: Option<PathBuf>,
    pub include_timestamp: Option<bool>,
}

pub fn merge_cli_with_config(mut config: Config, cli: CliOverrides) -> Config {
    macro_rules! apply {
        ($($src:ident => $($dst:ident).+),* $(,)?) => {
            $(if let Some(value) = cli.$src {
                config.$($dst).+ = value;
            })*
        };
    }

    if cli.path.is_some() {
        config.path = cli.path;
    }
    apply!(
        include_extensions => include_extensions,
        exclude_globs => exclude_globs,
        max_file_bytes => max_file_bytes,
        respect_gitignore => respect_gitignore,
        follow_symlinks => follow_symlinks,
        skip_minified => skip_minified,
        languages => languages,
        complexity_threshold => complexity_threshold,
        policy => policy,
        workers => workers,
        coverage => coverage.enabled,
        coverage_timeout_ms => coverage.timeout_ms,
        coverage_workers => coverage.workers,
        interpreter => coverage.interpreter,
        sandbox => coverage.sandbox,
        fanout => fanout.enabled,
        fanout_threshold => fanout.threshold,
        output_dir => output_dir,
        include_timestamp => include_timestamp,
    );
    config
}
