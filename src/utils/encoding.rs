//! Encoding-tolerant file reading.
//!
//! Source trees pulled from arbitrary repositories mix UTF-8, UTF-8 with BOM,
//! UTF-16 and legacy single-byte encodings. Reads go through:
//! - BOM sniffing (UTF-8, UTF-16 LE/BE)
//! - strict UTF-8 fast path
//! - chardetng guess with replacement characters as the fallback

use anyhow::{Context, Result};
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BINARY_SAMPLE_SIZE: usize = 8192;

/// Read a file as text, decoding whatever encoding it is in.
///
/// Returns the decoded content and the encoding label used.
pub fn read_source(path: &Path) -> Result<(String, &'static str)> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(decode_bytes(&bytes))
}

pub fn decode_bytes(bytes: &[u8]) -> (String, &'static str) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (decoded, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        let label = if encoding == UTF_8 {
            "utf-8-sig"
        } else if encoding == UTF_16LE {
            "utf-16-le"
        } else if encoding == UTF_16BE {
            "utf-16-be"
        } else {
            encoding.name()
        };
        return (decoded.into_owned(), label);
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return (text.to_string(), "utf-8");
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    let (decoded, used, _) = encoding.decode(bytes);
    (decoded.into_owned(), used.name())
}

/// Detect a binary file from a leading sample.
///
/// NUL bytes or fewer than 70% printable bytes mark the file as binary.
/// Unreadable files count as binary so they are skipped.
pub fn is_binary_file(path: &Path) -> bool {
    let mut sample = vec![0u8; BINARY_SAMPLE_SIZE];
    let read = File::open(path).and_then(|mut file| file.read(&mut sample));
    match read {
        Ok(n) => is_binary_sample(&sample[..n]),
        Err(_) => true,
    }
}

fn is_binary_sample(sample: &[u8]) -> bool {
    if sample.is_empty() {
        return false;
    }
    // UTF-16 text carries NUL bytes; trust the BOM.
    if Encoding::for_bom(sample).is_some() {
        return false;
    }
    if sample.contains(&0) {
        return true;
    }
    let printable = sample
        .iter()
        .filter(|&&b| (32..=126).contains(&b) || b == b'\t' || b == b'\n' || b == b'\r' || b >= 0x80)
        .count();
    (printable as f64 / sample.len() as f64) < 0.70
}
