//! Immutable source file values fed to the selector

use super::Language;
use crate::utils::{content_digest, normalize_path};
use serde::{Deserialize, Serialize};

/// A source file identified by its path relative to the scan root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub language: Language,
    pub line_count: usize,
    pub content: String,
}

impl SourceFile {
    /// Build a file value, detecting the language from the path.
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = normalize_path(&path.into());
        let language = Language::from_path(&path);
        Self::with_language(path, language, content)
    }

    pub fn with_language(
        path: impl Into<String>,
        language: Language,
        content: impl Into<String>,
    ) -> Self {
        let content = content.into();
        Self { path: normalize_path(&path.into()), language, line_count: count_lines(&content), content }
    }

    pub fn digest(&self) -> String {
        content_digest(&self.content)
    }
}

/// Count newline-delimited lines, including a trailing partial line.
///
/// Used for both the retained and the total line counts.
pub fn count_lines(content: &str) -> usize {
    if content.is_empty() {
        return 0;
    }
    let newlines = content.bytes().filter(|&b| b == b'\n').count();
    if content.ends_with('\n') {
        newlines
    } else {
        newlines + 1
    }
}
