//! Language detection from file extensions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Languages recognised by the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Java,
    C,
    Cpp,
    Kotlin,
    Html,
    Css,
    Markdown,
    Go,
    Rust,
    Ruby,
    Php,
    CSharp,
    Swift,
    Json,
    Xml,
    Plaintext,
}

/// Extensions accepted by the discovery layer.
///
/// Anything outside this list is rejected when it appears in configuration.
pub fn default_include_extensions() -> &'static [&'static str] {
    &[
        ".py", ".js", ".java", ".c", ".cpp", ".h", ".kt", ".html", ".css", ".md", ".go", ".rs",
        ".ts", ".tsx", ".rb", ".php", ".cs", ".swift", ".ipynb", ".csproj",
    ]
}

/// Languages that have a complexity grammar and are therefore eligible by default.
pub fn analyzable_languages() -> &'static [Language] {
    &[
        Language::Python,
        Language::Rust,
        Language::JavaScript,
        Language::TypeScript,
        Language::Tsx,
        Language::Go,
    ]
}

impl Language {
    /// Map a dot-prefixed, lowercase extension to a language.
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            ".py" | ".pyw" => Self::Python,
            ".js" | ".jsx" | ".mjs" | ".cjs" => Self::JavaScript,
            ".ts" | ".mts" | ".cts" => Self::TypeScript,
            ".tsx" => Self::Tsx,
            ".java" => Self::Java,
            ".c" => Self::C,
            ".cpp" | ".cc" | ".cxx" | ".h" | ".hpp" => Self::Cpp,
            ".kt" | ".kts" => Self::Kotlin,
            ".html" | ".htm" => Self::Html,
            ".css" => Self::Css,
            ".md" => Self::Markdown,
            ".go" => Self::Go,
            ".rs" => Self::Rust,
            ".rb" => Self::Ruby,
            ".php" => Self::Php,
            ".cs" => Self::CSharp,
            ".swift" => Self::Swift,
            ".ipynb" => Self::Json,
            ".csproj" => Self::Xml,
            _ => Self::Plaintext,
        }
    }

    pub fn from_path(path: &str) -> Self {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();
        Self::from_extension(&ext)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::Java => "java",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::Kotlin => "kotlin",
            Self::Html => "html",
            Self::Css => "css",
            Self::Markdown => "markdown",
            Self::Go => "go",
            Self::Rust => "rust",
            Self::Ruby => "ruby",
            Self::Php => "php",
            Self::CSharp => "csharp",
            Self::Swift => "swift",
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Plaintext => "plaintext",
        }
    }

    pub fn is_analyzable(self) -> bool {
        analyzable_languages().contains(&self)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lang = match s.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Self::Python,
            "javascript" | "js" => Self::JavaScript,
            "typescript" | "ts" => Self::TypeScript,
            "tsx" => Self::Tsx,
            "java" => Self::Java,
            "c" => Self::C,
            "cpp" | "c++" => Self::Cpp,
            "kotlin" | "kt" => Self::Kotlin,
            "html" => Self::Html,
            "css" => Self::Css,
            "markdown" | "md" => Self::Markdown,
            "go" | "golang" => Self::Go,
            "rust" | "rs" => Self::Rust,
            "ruby" | "rb" => Self::Ruby,
            "php" => Self::Php,
            "csharp" | "c#" | "cs" => Self::CSharp,
            "swift" => Self::Swift,
            "json" => Self::Json,
            "xml" => Self::Xml,
            "plaintext" | "text" => Self::Plaintext,
            other => return Err(format!("Unknown language '{}'", other)),
        };
        Ok(lang)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_original_extension_table() {
        assert_eq!(Language::from_path("a/b/main.py"), Language::Python);
        assert_eq!(Language::from_path("x.H"), Language::Cpp);
        assert_eq!(Language::from_path("nb.ipynb"), Language::Json);
        assert_eq!(Language::from_path("proj.csproj"), Language::Xml);
        assert_eq!(Language::from_path("view.tsx"), Language::Tsx);
        assert_eq!(Language::from_path("Makefile"), Language::Plaintext);
    }

    #[test]
    fn parses_language_aliases() {
        assert_eq!("Rust".parse::<Language>(), Ok(Language::Rust));
        assert_eq!("ts".parse::<Language>(), Ok(Language::TypeScript));
        assert!("cobol".parse::<Language>().is_err());
    }

    #[test]
    fn only_grammar_backed_languages_are_analyzable() {
        assert!(Language::Go.is_analyzable());
        assert!(!Language::Markdown.is_analyzable());
        assert!(!Language::Java.is_analyzable());
    }
}
