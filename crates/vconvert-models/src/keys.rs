//! Object key conventions.
//!
//! Destination keys are a pure function of the destination prefix and the
//! source key, so re-running a batch over the same bucket overwrites the
//! previous outputs instead of producing new names.

/// Extension every transcoded output carries, regardless of source container.
pub const OUTPUT_EXTENSION: &str = "mp4";

/// Final path component of an object key.
pub fn basename(key: &str) -> &str {
    match key.rsplit_once('/') {
        Some((_, name)) => name,
        None => key,
    }
}

/// Strip the last extension from a file name, if it has one.
///
/// Dotfiles such as `.hidden` are treated as having no extension.
fn file_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Build the destination key for a source key.
///
/// `{prefix}/{basename(source_key) with its extension replaced by .mp4}`.
/// Trailing slashes on `prefix` are ignored; an empty prefix yields the bare
/// file name.
pub fn destination_key(prefix: &str, source_key: &str) -> String {
    let name = format!("{}.{}", file_stem(basename(source_key)), OUTPUT_EXTENSION);
    let prefix = prefix.trim_end_matches('/');

    if prefix.is_empty() {
        name
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// Filesystem-safe label derived from the full object key.
///
/// Every byte outside `[A-Za-z0-9._-]` becomes `_`. The label is only used as
/// a readable prefix for staging directories; uniqueness comes from the
/// directory itself.
pub fn staging_label(key: &str) -> String {
    let label: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if label.is_empty() {
        "object".to_string()
    } else {
        label
    }
}
