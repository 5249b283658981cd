//! Minified/bundled file detection.

const MINIFIED_INDICATORS: &[&str] = &[".min.", ".bundle.", ".packed."];

/// Check whether a file looks minified from its name or its first line.
///
/// # Arguments
/// * `relative_path` - Path relative to the scan root
/// * `content` - Decoded file content
/// * `max_line_length` - First-line length above which the file counts as minified
pub fn is_likely_minified(relative_path: &str, content: &str, max_line_length: usize) -> bool {
    let name = relative_path.rsplit('/').next().unwrap_or(relative_path).to_lowercase();
    if MINIFIED_INDICATORS.iter().any(|indicator| name.contains(indicator)) {
        return true;
    }
    content.lines().next().map(|line| line.chars().count() > max_line_length).unwrap_or(false)
}
