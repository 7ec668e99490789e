//! Output file naming.
//!
//! WebAnno exports keep the percent-encoding of the uploaded document name,
//! sometimes twice over (`%2520` for a space). Names are decoded before use
//! and their extension is rewritten for the target format.

use std::path::Path;

use crate::error::{ConllError, Result};
use crate::transcode::OutputFormat;

/// Suffix inserted before the extension of a trimmed section file.
pub const SECTION_SUFFIX: &str = "-p1";

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

fn decode_once(name: &str) -> String {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|_| name.to_string())
}

/// WebAnno encodes uploaded names at most twice (`%2520` for a space).
const DECODE_PASSES: usize = 2;

/// Percent-decode a file name, undoing at most two layers of encoding.
///
/// Sequences that would not decode to valid UTF-8 are left untouched. A
/// decoded path separator is replaced by `_` so the name stays a single
/// path component.
pub fn decode_file_name(name: &str) -> String {
    let mut current = name.to_string();
    for _ in 0..DECODE_PASSES {
        let decoded = decode_once(&current);
        if decoded == current {
            break;
        }
        current = decoded;
    }
    current.replace(['/', '\\'], "_")
}

/// Replace the extension of `name` (if any) with `extension`.
pub fn with_extension(name: &str, extension: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);
    if extension.is_empty() {
        stem.to_string()
    } else {
        format!("{stem}.{extension}")
    }
}

/// Output file name for a transcoded export.
pub fn output_name(input: &Path, format: OutputFormat) -> Result<String> {
    let raw = input
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ConllError::BadFileName(input.to_path_buf()))?;
    Ok(with_extension(&decode_file_name(raw), format.extension()))
}

/// Insert `suffix` between the stem and the extension of `name`.
pub fn with_suffix(name: &str, suffix: &str) -> String {
    let path = Path::new(name);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(name);
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}{suffix}.{ext}"),
        None => format!("{stem}{suffix}"),
    }
}
