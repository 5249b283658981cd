//! File scanner implementation with gitignore support

use crate::domain::{Config, FailureKind, ScanStats, SoftFailure, SourceFile};
use crate::utils::{is_binary_file, is_likely_minified, normalize_path, read_source};
use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const MAX_FIRST_LINE_LENGTH: usize = 5000;

/// Files discovered under a root, plus the ones that could not be read.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub files: Vec<SourceFile>,
    pub failures: Vec<SoftFailure>,
}

/// Discovers source files under a root while respecting gitignore rules.
pub struct FileScanner {
    root_path: PathBuf,
    include_extensions: Vec<String>,
    exclude_globs: Vec<String>,
    max_file_bytes: u64,
    respect_gitignore: bool,
    follow_symlinks: bool,
    skip_minified: bool,
    stats: ScanStats,
}

impl FileScanner {
    /// Create a scanner with the default configuration.
    pub fn new(root_path: PathBuf) -> Self {
        Self::from_config(root_path, &Config::default())
    }

    pub fn from_config(root_path: PathBuf, config: &Config) -> Self {
        Self {
            root_path,
            include_extensions: config.include_extensions.clone(),
            exclude_globs: config.exclude_globs.clone(),
            max_file_bytes: config.max_file_bytes,
            respect_gitignore: config.respect_gitignore,
            follow_symlinks: config.follow_symlinks,
            skip_minified: config.skip_minified,
            stats: ScanStats::default(),
        }
    }

    /// Set file extensions to include (e.g., ".rs", ".py")
    pub fn include_extensions(mut self, extensions: Vec<String>) -> Self {
        self.include_extensions = extensions;
        self
    }

    /// Set glob patterns to exclude
    pub fn exclude_globs(mut self, globs: Vec<String>) -> Self {
        self.exclude_globs = globs;
        self
    }

    pub fn max_file_bytes(mut self, max_bytes: u64) -> Self {
        self.max_file_bytes = max_bytes;
        self
    }

    pub fn respect_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }

    fn build_exclude_globset(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude_globs {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => warn!("Ignoring invalid exclude glob '{}': {}", pattern, e),
            }
        }
        Ok(builder.build()?)
    }

    fn should_include_extension(&self, path: &Path) -> bool {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase();
        if ext.is_empty() {
            return false;
        }
        self.include_extensions.contains(&format!(".{}", ext))
    }

    /// Walk the root and read every eligible file.
    ///
    /// Files are returned in deterministic order by relative path. Unreadable
    /// files become `io` soft failures and do not abort the scan.
    pub fn scan(&mut self) -> Result<ScanOutcome> {
        self.stats = ScanStats::default();

        let exclude_globset = self.build_exclude_globset()?;

        let dir_filter = |entry: &ignore::DirEntry| -> bool {
            if let Some(file_type) = entry.file_type() {
                if file_type.is_dir() {
                    if let Some(name) = entry.file_name().to_str() {
                        if matches!(
                            name,
                            "node_modules" | "__pycache__" | ".git" | ".venv" | "venv" | "target"
                        ) {
                            return false;
                        }
                        if name.starts_with('.') && name != ".github" && entry.depth() > 0 {
                            return false;
                        }
                    }
                }
            }
            true
        };

        // A second walk without ignore rules yields files_skipped_gitignore by difference.
        let raw_file_count = if self.respect_gitignore {
            let mut raw_builder = WalkBuilder::new(&self.root_path);
            raw_builder
                .git_ignore(false)
                .git_global(false)
                .git_exclude(false)
                .ignore(false)
                .follow_links(self.follow_symlinks)
                .hidden(false)
                .parents(false)
                .filter_entry(dir_filter);
            raw_builder.build().flatten().filter(|e| !e.path().is_dir()).count()
        } else {
            0
        };

        let mut builder = WalkBuilder::new(&self.root_path);
        builder
            .git_ignore(self.respect_gitignore)
            .git_global(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .ignore(self.respect_gitignore)
            .require_git(false)
            .follow_links(self.follow_symlinks)
            .hidden(false)
            .parents(true)
            .filter_entry(dir_filter);

        let mut candidates: Vec<(PathBuf, String)> = Vec::new();
        let mut failures = Vec::new();
        let mut visible_count = 0usize;

        for entry_result in builder.build() {
            let entry = match entry_result {
                Ok(e) => e,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if path.is_dir() {
                continue;
            }

            visible_count += 1;
            self.stats.files_scanned += 1;

            let rel_path = match path.strip_prefix(&self.root_path) {
                Ok(p) => normalize_path(&p.to_string_lossy()),
                Err(_) => continue,
            };

            if exclude_globset.is_match(&rel_path) {
                self.stats.files_skipped_glob += 1;
                continue;
            }

            if !self.should_include_extension(path) {
                self.stats.files_skipped_extension += 1;
                continue;
            }

            let size = match path.metadata() {
                Ok(m) => m.len(),
                Err(e) => {
                    failures.push(SoftFailure::new(&rel_path, FailureKind::Io, e.to_string()));
                    continue;
                }
            };
            if size > self.max_file_bytes {
                self.stats.files_skipped_size += 1;
                continue;
            }

            if is_binary_file(path) {
                self.stats.files_skipped_binary += 1;
                continue;
            }

            candidates.push((path.to_path_buf(), rel_path));
        }

        if self.respect_gitignore {
            self.stats.files_skipped_gitignore = raw_file_count.saturating_sub(visible_count);
        }

        candidates.sort_by(|a, b| a.1.cmp(&b.1));

        let mut files = Vec::with_capacity(candidates.len());
        for (path, rel_path) in candidates {
            let content = match read_source(&path) {
                Ok((content, encoding)) => {
                    if encoding != "utf-8" {
                        debug!(path = %rel_path, encoding, "decoded non-utf8 source");
                    }
                    content
                }
                Err(e) => {
                    warn!("Skipping unreadable file {}: {:#}", rel_path, e);
                    failures.push(SoftFailure::new(&rel_path, FailureKind::Io, format!("{:#}", e)));
                    continue;
                }
            };

            if self.skip_minified && is_likely_minified(&rel_path, &content, MAX_FIRST_LINE_LENGTH) {
                self.stats.files_skipped_minified += 1;
                continue;
            }

            self.stats.files_included += 1;
            self.stats.total_bytes_included += content.len() as u64;
            files.push(SourceFile::new(rel_path, content));
        }

        Ok(ScanOutcome { files, failures })
    }

    /// Get scanning statistics
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Language;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scanner_basic() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("b.rs"), "fn main() {}\n").unwrap();
        fs::write(root.join("a.py"), "print('hello')\n").unwrap();
        fs::write(root.join("notes.txt"), "text file").unwrap();

        let mut scanner = FileScanner::new(root.to_path_buf());
        let outcome = scanner.scan().unwrap();

        let paths: Vec<&str> = outcome.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a.py", "b.rs"]);
        assert_eq!(outcome.files[0].language, Language::Python);
        assert_eq!(outcome.files[0].line_count, 1);
        assert_eq!(scanner.stats().files_skipped_extension, 1);
    }

    #[test]
    fn test_scanner_respects_size_limit() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("large.rs"), "a".repeat(2_000_000)).unwrap();
        fs::write(root.join("small.rs"), "fn main() {}").unwrap();

        let mut scanner = FileScanner::new(root.to_path_buf()).max_file_bytes(1_000_000);
        let outcome = scanner.scan().unwrap();

        assert_eq!(outcome.files.len(), 1);
        assert_eq!(outcome.files[0].path, "small.rs");
        assert_eq!(scanner.stats().files_skipped_size, 1);
    }

    #[test]
    fn test_scanner_extension_filtering() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("test.rs"), "fn main() {}").unwrap();
        fs::write(root.join("test.py"), "x = 1").unwrap();

        let mut scanner =
            FileScanner::new(root.to_path_buf()).include_extensions(vec![".rs".to_string()]);
        let outcome = scanner.scan().unwrap();

        assert_eq!(outcome.files.len(), 1);
        assert_eq!(outcome.files[0].path, "test.rs");
    }

    #[test]
    fn test_exclude_globs_and_minified() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("vendor")).unwrap();
        fs::write(root.join("vendor/lib.py"), "x = 1\n").unwrap();
        fs::write(root.join("app.min.js"), "var a=1;").unwrap();
        fs::write(root.join("app.js"), "var a = 1;\n").unwrap();

        let mut scanner =
            FileScanner::new(root.to_path_buf()).exclude_globs(vec!["vendor/**".to_string()]);
        let outcome = scanner.scan().unwrap();

        let paths: Vec<&str> = outcome.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["app.js"]);
        assert_eq!(scanner.stats().files_skipped_glob, 1);
        assert_eq!(scanner.stats().files_skipped_minified, 1);
    }

    #[test]
    fn test_gitignore_respected() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join(".gitignore"), "generated/\n").unwrap();
        fs::create_dir_all(root.join("generated")).unwrap();
        fs::write(root.join("generated/out.py"), "x = 1\n").unwrap();
        fs::write(root.join("main.py"), "x = 2\n").unwrap();

        let mut scanner = FileScanner::new(root.to_path_buf());
        let outcome = scanner.scan().unwrap();
        let paths: Vec<&str> = outcome.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["main.py"]);
        assert_eq!(scanner.stats().files_skipped_gitignore, 1);

        let mut unfiltered = FileScanner::new(root.to_path_buf()).respect_gitignore(false);
        assert_eq!(unfiltered.scan().unwrap().files.len(), 2);
    }

    #[test]
    fn test_noise_dirs_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        for noise_dir in &["node_modules", "__pycache__", ".venv", "venv", ".cache"] {
            fs::create_dir_all(root.join(noise_dir)).unwrap();
            fs::write(root.join(noise_dir).join("file.py"), "# noise").unwrap();
        }
        fs::write(root.join("main.py"), "print('hello')").unwrap();

        let mut scanner = FileScanner::new(root.to_path_buf()).respect_gitignore(false);
        let outcome = scanner.scan().unwrap();

        let paths: Vec<&str> = outcome.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["main.py"], "only main.py should be found");
    }

    #[test]
    fn test_binary_files_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("blob.py"), [0u8, 159, 146, 150]).unwrap();
        fs::write(root.join("ok.py"), "x = 1\n").unwrap();

        let mut scanner = FileScanner::new(root.to_path_buf());
        let outcome = scanner.scan().unwrap();
        assert_eq!(outcome.files.len(), 1);
        assert_eq!(scanner.stats().files_skipped_binary, 1);
        assert_eq!(scanner.stats().files_scanned, 2);
    }
}
