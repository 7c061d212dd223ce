//! Cached entry type with expiration metadata.
//!
//! [`CacheEntry`] wraps cached data with its creation and expiration
//! timestamps. An entry stored with an unbounded time-to-live carries
//! `expires_at: None`; a bounded one carries `created_at + ttl` as computed
//! at creation time.
//!
//! Expiration is enforced twice:
//!
//! - **Eagerly** by a store's eviction timer, if it arms one.
//! - **Lazily** at read time via [`CacheEntry::is_expired`] — a read that
//!   discovers a stale entry must discard it and report absence, even if
//!   no timer has fired yet.
//!
//! The store exclusively owns its entries and any eviction timers;
//! callers only ever observe copies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cached value with creation and expiration metadata.
///
/// # Example
///
/// ```
/// use fetchbox_core::CacheEntry;
/// use std::time::Duration;
///
/// let entry = CacheEntry::new("user data", Some(Duration::from_secs(60)));
/// assert!(!entry.is_expired());
/// assert!(entry.expires_at().is_some());
///
/// let forever = CacheEntry::new("pinned", None);
/// assert!(forever.expires_at().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    data: T,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl<T> CacheEntry<T> {
    /// Creates an entry stamped with the current time.
    ///
    /// `ttl = None` means the entry never expires. Any bounded ttl is
    /// honored as requested, including zero, which makes the entry
    /// immediately eligible for expiration.
    pub fn new(data: T, ttl: Option<Duration>) -> Self {
        let created_at = Utc::now();
        let expires_at = ttl
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .and_then(|ttl| created_at.checked_add_signed(ttl));
        CacheEntry {
            data,
            created_at,
            expires_at,
        }
    }

    /// Reassembles an entry from previously stored metadata.
    pub fn from_parts(
        data: T,
        created_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        CacheEntry {
            data,
            created_at,
            expires_at,
        }
    }

    /// Returns a reference to the cached data.
    #[inline]
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Returns when the entry was stored.
    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the entry expires, or `None` for an unbounded ttl.
    #[inline]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Consumes the entry and returns the inner data.
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Whether the expiration deadline has passed.
    ///
    /// Entries with an unbounded ttl never expire.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= Utc::now())
    }

    /// Remaining time-to-live.
    ///
    /// Returns `None` for an unbounded ttl or an already-expired entry.
    pub fn ttl(&self) -> Option<Duration> {
        self.expires_at.and_then(|expires_at| {
            expires_at
                .signed_duration_since(Utc::now())
                .to_std()
                .ok()
                .filter(|remaining| !remaining.is_zero())
        })
    }

    /// Maps the cached data, keeping the metadata.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CacheEntry<U> {
        CacheEntry {
            data: f(self.data),
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }

    /// Maps the cached data through a fallible conversion, keeping the
    /// metadata.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<CacheEntry<U>, E> {
        Ok(CacheEntry {
            data: f(self.data)?,
            created_at: self.created_at,
            expires_at: self.expires_at,
        })
    }
}
