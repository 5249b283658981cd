//! Shared CLI utilities.

use crate::domain::{normalize_extensions, Language};
use anyhow::{anyhow, Result};

/// Parse a comma-separated string into a `Vec<String>`, trimming whitespace and
/// discarding empty segments.  Returns `None` when `value` is `None`.
pub fn parse_csv(value: &Option<String>) -> Option<Vec<String>> {
    value.as_ref().map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
    })
}

pub fn parse_extensions(value: &Option<String>) -> Result<Option<Vec<String>>> {
    parse_csv(value).map(|items| normalize_extensions(items).map_err(|e| anyhow!(e))).transpose()
}

pub fn parse_languages(value: &Option<String>) -> Result<Option<Vec<Language>>> {
    parse_csv(value)
        .map(|items| {
            items
                .iter()
                .map(|item| item.parse::<Language>().map_err(|e| anyhow!(e)))
                .collect::<Result<Vec<_>>>()
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_trims_and_drops_empty() {
        assert_eq!(
            parse_csv(&Some(" a, ,b ".to_string())),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(parse_csv(&None), None);
    }

    #[test]
    fn extensions_and_languages_are_validated() {
        assert_eq!(parse_extensions(&Some("py,rs".into())).unwrap(), Some(vec![".py".into(), ".rs".into()]));
        assert!(parse_extensions(&Some("exe".into())).is_err());
        assert_eq!(parse_languages(&Some("go, rust".into())).unwrap(), Some(vec![Language::Go, Language::Rust]));
        assert!(parse_languages(&Some("cobol".into())).is_err());
    }
}
