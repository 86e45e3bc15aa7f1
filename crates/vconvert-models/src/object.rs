//! Source object discovered in a bucket listing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::filter::extension_of;

/// Identity of one unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceObject {
    /// Object key, unique within a run
    pub key: String,
    /// Lower-cased extension inferred from the key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    /// Size in bytes as reported by the listing
    #[serde(default)]
    pub size: u64,
}

impl SourceObject {
    /// Create a source object, inferring its extension from the key.
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        let key = key.into();
        let extension = extension_of(&key);
        Self {
            key,
            extension,
            size,
        }
    }
}

impl fmt::Display for SourceObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}
