//! Cache key type.
//!
//! A [`CacheKey`] is a caller-chosen string identifying a cacheable
//! response. The core imposes no derivation, hashing, or namespacing;
//! uniqueness scope is the store instance the key is used against.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Opaque cache key.
///
/// Wraps the caller-supplied string. Cloning is cheap: short keys are
/// stored inline, longer ones share an allocation.
///
/// # Example
///
/// ```
/// use fetchbox_core::CacheKey;
///
/// let key = CacheKey::new("users:42");
/// assert_eq!(key.as_str(), "users:42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(SmolStr);

impl CacheKey {
    /// Creates a cache key from any string-like value.
    pub fn new(key: impl AsRef<str>) -> Self {
        CacheKey(SmolStr::new(key))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        CacheKey::new(key)
    }
}

impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        CacheKey(SmolStr::from(key))
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
