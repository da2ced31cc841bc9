//! Sanitizers for caller-supplied values that end up in file names and
//! response headers.

/// Longest label kept for the download file name.
pub const MAX_LABEL_LEN: usize = 80;

/// Longest extension kept.
pub const MAX_EXTENSION_LEN: usize = 10;

pub const DEFAULT_LABEL: &str = "video";
pub const DEFAULT_EXTENSION: &str = "mp4";

/// Reduces a label to ASCII alphanumerics, `_` and `-`, with whitespace runs
/// collapsed to a single `_`.
pub fn sanitize_label(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-') || c.is_whitespace())
        .collect();

    let label: String = kept
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .take(MAX_LABEL_LEN)
        .collect();

    if label.is_empty() {
        DEFAULT_LABEL.to_string()
    } else {
        label
    }
}

/// Keeps the leading run of ASCII alphanumerics, lowercased.
///
/// Anything after the first other character is dropped, so `mp4\0evil`
/// becomes `mp4`.
pub fn sanitize_extension(raw: &str) -> String {
    let ext: String = raw
        .trim()
        .trim_start_matches('.')
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .take(MAX_EXTENSION_LEN)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if ext.is_empty() {
        DEFAULT_EXTENSION.to_string()
    } else {
        ext
    }
}
