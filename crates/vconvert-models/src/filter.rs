//! Accepted-extension filter for source discovery.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Extensions accepted when no explicit set is configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["mp4", "webm", "avi", "mkv"];

/// Set of object suffixes that qualify as source videos.
///
/// Extensions are stored lower-cased without the leading dot and matched
/// case-insensitively against the last extension of a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionFilter {
    extensions: BTreeSet<String>,
}

impl ExtensionFilter {
    /// Create a filter from a list of extensions (`".webm"` and `"webm"` are equivalent).
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .filter_map(|ext| normalize(ext.as_ref()))
            .collect();
        Self { extensions }
    }

    /// Parse a comma-separated list such as `"mp4, .webm,MKV"`.
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// Whether `key` ends in one of the accepted extensions.
    pub fn accepts(&self, key: &str) -> bool {
        extension_of(key)
            .map(|ext| self.extensions.contains(&ext))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}

impl fmt::Display for ExtensionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list: Vec<&str> = self.extensions().collect();
        write!(f, "{}", list.join(","))
    }
}

fn normalize(ext: &str) -> Option<String> {
    let ext = ext.trim().trim_start_matches('.');
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

/// Lower-cased last extension of the key's final path component.
pub(crate) fn extension_of(key: &str) -> Option<String> {
    let name = crate::keys::basename(key);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            Some(ext.to_ascii_lowercase())
        }
        _ => None,
    }
}
