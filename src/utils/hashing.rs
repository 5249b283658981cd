//! Stable content digests for verdict auditing

use sha2::{Digest, Sha256};

/// SHA-256 of the content, first 16 hex chars.
pub fn content_digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    format!("{:x}", result)[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::content_digest;

    #[test]
    fn digest_is_stable_and_content_sensitive() {
        assert_eq!(content_digest("def f(): pass"), content_digest("def f(): pass"));
        assert_ne!(content_digest("a"), content_digest("b"));
    }
}
