use crate::error::{Error, Result};

/// Longest sanitized name, in bytes, before the extension is re-attached.
pub const MAX_NAME_LEN: usize = 128;

/// Turn an untrusted, caller-supplied file name into a single safe path
/// component.
///
/// Rejects names that try to leave the working directory: a `..` component,
/// a leading separator, or a drive prefix. Everything else is cleaned rather
/// than rejected: separators become `_`, characters outside
/// `[A-Za-z0-9._-]` become `_`, leading dots are dropped so the result is
/// never hidden, and the stem is truncated to [`MAX_NAME_LEN`] while the
/// extension is kept.
pub fn sanitize_file_name(name: &str) -> Result<String> {
    let invalid = |reason| Error::InvalidName {
        name: name.to_string(),
        reason,
    };

    if name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.contains('\0') {
        return Err(invalid("name contains a NUL byte"));
    }
    if is_absolute(name) {
        return Err(invalid("absolute paths are not allowed"));
    }
    if name.split(['/', '\\']).any(|part| part == "..") {
        return Err(invalid("path traversal is not allowed"));
    }

    let cleaned: String = name
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.trim_matches(['_', '.']).is_empty() {
        return Err(invalid("name has no usable characters"));
    }

    Ok(truncate_keeping_extension(cleaned))
}

fn is_absolute(name: &str) -> bool {
    let bytes = name.as_bytes();
    let drive = bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
    name.starts_with(['/', '\\']) || drive
}

// Input is ASCII by construction, so byte slicing is char-safe.
fn truncate_keeping_extension(name: &str) -> String {
    let (stem, ext) = match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    };
    let ext = &ext[..ext.len().min(MAX_NAME_LEN / 4)];
    let stem = &stem[..stem.len().min(MAX_NAME_LEN)];
    format!("{stem}{ext}")
}
