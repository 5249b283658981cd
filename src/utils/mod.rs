//! Shared helpers: tolerant file reading, path arithmetic and hashing

pub mod classify;
pub mod encoding;
pub mod hashing;
pub mod paths;

pub use classify::is_likely_minified;
pub use encoding::{is_binary_file, read_source};
pub use hashing::content_digest;
pub use paths::{join_relative, normalize_path, parent_dir};
