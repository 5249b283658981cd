//! Path helpers for forward-slash, root-relative paths

pub fn normalize_path(path: &str) -> String {
    let slashed = path.replace('\\', "/");
    slashed.strip_prefix("./").map(str::to_string).unwrap_or(slashed)
}

/// Directory part of a relative path, `""` for files at the root.
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Join `rel` onto `base_dir`, folding `.` and `..` segments.
///
/// Returns `None` when the result would escape the scan root.
pub fn join_relative(base_dir: &str, rel: &str) -> Option<String> {
    let mut segments: Vec<&str> = if rel.starts_with('/') {
        Vec::new()
    } else {
        base_dir.split('/').filter(|s| !s.is_empty()).collect()
    };
    for part in rel.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}
