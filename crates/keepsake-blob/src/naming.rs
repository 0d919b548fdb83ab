//! Blob name generation and validation.
//!
//! Generated names start with the upload time so a directory listing sorts
//! chronologically, followed by a short random nonce so two uploads of the
//! same file in the same millisecond still get distinct names.

use crate::{BlobError, Result};

/// Longest sanitized original filename kept in a blob name.
const MAX_ORIGINAL_LEN: usize = 100;

/// Longest blob name accepted by [`validate_name`].
const MAX_NAME_LEN: usize = 255;

/// Reduce an uploaded filename to a safe single path component.
///
/// Directory parts are dropped, characters outside `[A-Za-z0-9._-]` become
/// `_`, runs of dots collapse to one, and leading dots are stripped so the result can never be hidden or
/// climb out of the store root. Over-long names keep their tail, which
/// preserves the extension.
///
/// # Example
/// ```
/// use keepsake_blob::naming::sanitize_filename;
/// assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
/// assert_eq!(sanitize_filename("my photo (1).PNG"), "my_photo__1_.PNG");
/// assert_eq!(sanitize_filename(""), "upload");
/// ```
pub fn sanitize_filename(original: &str) -> String {
    let base = original
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let mut cleaned = String::with_capacity(base.len());
    for c in base.chars() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
            c
        } else {
            '_'
        };
        // Runs of dots collapse so a generated name never contains "..".
        if c == '.' && cleaned.ends_with('.') {
            continue;
        }
        cleaned.push(c);
    }

    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        return "upload".to_string();
    }

    let len = trimmed.len();
    if len > MAX_ORIGINAL_LEN {
        // All characters are ASCII here, so byte slicing is safe.
        trimmed[len - MAX_ORIGINAL_LEN..].to_string()
    } else {
        trimmed.to_string()
    }
}

/// Generate a fresh blob name for an uploaded file.
pub fn generate_blob_name(original: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    format!(
        "{}-{}-{}",
        millis,
        nanoid::nanoid!(8, &NONCE_ALPHABET),
        sanitize_filename(original)
    )
}

const NONCE_ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Check that a name refers to a single blob inside the store root.
pub fn validate_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name.len() > MAX_NAME_LEN
        || name.starts_with('.')
        || name.contains("..")
        || name.contains(['/', '\\', '\0']);

    if invalid {
        return Err(BlobError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Guess a content type from a blob name.
pub fn content_type_for(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
