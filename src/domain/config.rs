//! Selector configuration

use super::{default_include_extensions, Language};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

pub const DEFAULT_COMPLEXITY_THRESHOLD: u32 = 25;
pub const DEFAULT_FANOUT_THRESHOLD: usize = 5;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 3000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub path: Option<PathBuf>,
    #[serde(deserialize_with = "deserialize_extensions")]
    pub include_extensions: Vec<String>,
    #[serde(deserialize_with = "deserialize_string_list")]
    pub exclude_globs: Vec<String>,
    pub max_file_bytes: u64,
    pub respect_gitignore: bool,
    pub follow_symlinks: bool,
    pub skip_minified: bool,

    /// Eligible languages; empty means every language with a complexity grammar.
    #[serde(deserialize_with = "deserialize_languages")]
    pub languages: Vec<Language>,
    pub complexity_threshold: u32,
    /// `complexity`, `all`, `any`, or a boolean expression over the signal names.
    pub policy: String,
    /// Worker threads for complexity and fan-out analysis; 0 uses every core.
    pub workers: usize,
    pub coverage: CoverageConfig,
    pub fanout: FanoutConfig,

    pub output_dir: PathBuf,
    pub include_timestamp: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: None,
            include_extensions: default_include_extensions().iter().map(|s| s.to_string()).collect(),
            exclude_globs: Vec::new(),
            max_file_bytes: 1_048_576,
            respect_gitignore: true,
            follow_symlinks: false,
            skip_minified: true,
            languages: Vec::new(),
            complexity_threshold: DEFAULT_COMPLEXITY_THRESHOLD,
            policy: "complexity".to_string(),
            workers: 0,
            coverage: CoverageConfig::default(),
            fanout: FanoutConfig::default(),
            output_dir: PathBuf::from("repo-core-out"),
            include_timestamp: true,
        }
    }
}

impl Config {
    /// Whether a file of this language takes part in selection.
    pub fn is_eligible(&self, language: Language) -> bool {
        if self.languages.is_empty() {
            language.is_analyzable()
        } else {
            self.languages.contains(&language)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageConfig {
    pub enabled: bool,
    pub timeout_ms: u64,
    /// Concurrent probes; kept small since every probe spawns an interpreter.
    pub workers: usize,
    pub interpreter: String,
    pub memory_limit_mb: u64,
    /// Cap on processes the probed program may run (`RLIMIT_NPROC`).
    pub max_processes: u64,
    /// Bubblewrap launcher that confines every probe. Probing fails when it is missing.
    pub sandbox: String,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            workers: 2,
            interpreter: "python3".to_string(),
            memory_limit_mb: 512,
            max_processes: 64,
            sandbox: "bwrap".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanoutConfig {
    pub enabled: bool,
    pub threshold: usize,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self { enabled: false, threshold: DEFAULT_FANOUT_THRESHOLD }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl StringOrList {
    fn into_items(self) -> Vec<String> {
        let raw = match self {
            Self::One(s) => s.split(',').map(str::to_string).collect(),
            Self::Many(items) => items,
        };
        raw.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
    }
}

fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(StringOrList::deserialize(deserializer)?.into_items())
}

fn deserialize_extensions<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = StringOrList::deserialize(deserializer)?.into_items();
    normalize_extensions(items).map_err(serde::de::Error::custom)
}

fn deserialize_languages<'de, D>(deserializer: D) -> Result<Vec<Language>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut languages = Vec::new();
    for item in StringOrList::deserialize(deserializer)?.into_items() {
        let language: Language = item.parse().map_err(serde::de::Error::custom)?;
        if !languages.contains(&language) {
            languages.push(language);
        }
    }
    Ok(languages)
}

/// Trim, lowercase and dot-prefix extensions, rejecting any outside the whitelist.
pub fn normalize_extensions<I, S>(items: I) -> Result<Vec<String>, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized = Vec::new();
    let mut invalid = Vec::new();
    for item in items {
        let trimmed = item.as_ref().trim().to_lowercase();
        if trimmed.is_empty() {
            continue;
        }
        let ext = if trimmed.starts_with('.') { trimmed } else { format!(".{}", trimmed) };
        if !default_include_extensions().contains(&ext.as_str()) {
            invalid.push(ext);
        } else if !normalized.contains(&ext) {
            normalized.push(ext);
        }
    }
    if !invalid.is_empty() {
        return Err(format!("Invalid file extensions: {}", invalid.join(", ")));
    }
    Ok(normalized)
}
