//! Cache store traits.
//!
//! The contract is split in two, so stores stay pluggable and the typed
//! surface stays in one place:
//!
//! - [`Backend`] is the object-safe storage primitive over raw entry
//!   bytes. Implementations own the physical medium: an in-process map,
//!   a redis database, anything that can hold bytes under a string key.
//! - [`CacheStore`] is the typed extension every backend gets for free.
//!   Its default methods handle JSON encode/decode and enforce the
//!   lazy-expiration rule: a read that discovers a stale entry deletes it
//!   and reports absence, whether or not the backend's own eviction has
//!   caught up.

use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use fetchbox_core::{CacheEntry, CacheKey};
use serde::{Serialize, de::DeserializeOwned};
use tracing::trace;

use crate::error::BackendError;

/// Result alias for store operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Outcome of a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    /// A value was present and removed.
    Deleted,
    /// No value was stored under the key.
    Missing,
}

impl DeleteStatus {
    /// Whether a value was actually removed.
    pub fn was_deleted(self) -> bool {
        matches!(self, DeleteStatus::Deleted)
    }
}

/// Object-safe storage primitive over raw entry bytes.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Reads the raw entry stored under `key`.
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry<Bytes>>>;

    /// Stores `entry` under `key`, fully replacing any prior entry and
    /// cancelling its pending eviction. The entry's own metadata carries
    /// the expiration deadline; a backend with eager eviction derives its
    /// timer from [`CacheEntry::ttl`].
    async fn write(&self, key: &CacheKey, entry: CacheEntry<Bytes>) -> BackendResult<()>;

    /// Removes the entry stored under `key`, cancelling any pending
    /// eviction.
    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus>;

    /// Empties the store, cancelling every pending eviction.
    async fn clear(&self) -> BackendResult<()>;

    /// Name of this backend, for logging.
    fn name(&self) -> &str {
        "backend"
    }
}

#[async_trait]
impl Backend for &dyn Backend {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry<Bytes>>> {
        (*self).read(key).await
    }

    async fn write(&self, key: &CacheKey, entry: CacheEntry<Bytes>) -> BackendResult<()> {
        (*self).write(key, entry).await
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        (*self).remove(key).await
    }

    async fn clear(&self) -> BackendResult<()> {
        (*self).clear().await
    }

    fn name(&self) -> &str {
        (*self).name()
    }
}

#[async_trait]
impl Backend for Box<dyn Backend> {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry<Bytes>>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &CacheKey, entry: CacheEntry<Bytes>) -> BackendResult<()> {
        (**self).write(key, entry).await
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    async fn clear(&self) -> BackendResult<()> {
        (**self).clear().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl Backend for Arc<dyn Backend> {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry<Bytes>>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &CacheKey, entry: CacheEntry<Bytes>) -> BackendResult<()> {
        (**self).write(key, entry).await
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    async fn clear(&self) -> BackendResult<()> {
        (**self).clear().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Typed cache store surface, implemented for every [`Backend`].
///
/// The typed read is the authoritative lazy-expiration check: even when a
/// backend's own eviction lags (clock skew, paused timers), a stale entry
/// is deleted here and reported absent.
pub trait CacheStore: Backend {
    /// Reads the value stored under `key`.
    fn get<T>(&self, key: &CacheKey) -> impl Future<Output = BackendResult<Option<T>>> + Send
    where
        T: DeserializeOwned,
    {
        async move {
            Ok(self
                .get_entry(key)
                .await?
                .map(CacheEntry::into_inner))
        }
    }

    /// Reads the entry stored under `key` in metadata form.
    fn get_entry<T>(
        &self,
        key: &CacheKey,
    ) -> impl Future<Output = BackendResult<Option<CacheEntry<T>>>> + Send
    where
        T: DeserializeOwned,
    {
        async move {
            let Some(raw) = self.read(key).await? else {
                return Ok(None);
            };
            if raw.is_expired() {
                trace!(backend = self.name(), %key, "discarding stale entry on read");
                self.remove(key).await?;
                return Ok(None);
            }
            let entry = raw.try_map(|bytes| serde_json::from_slice::<T>(&bytes))?;
            Ok(Some(entry))
        }
    }

    /// Stores `value` under `key`.
    ///
    /// `ttl = None` stores the value without expiration.
    fn set<T>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: Option<Duration>,
    ) -> impl Future<Output = BackendResult<()>> + Send
    where
        T: Serialize + Sync,
    {
        async move {
            let bytes = Bytes::from(serde_json::to_vec(value)?);
            trace!(backend = self.name(), %key, ?ttl, "storing entry");
            self.write(key, CacheEntry::new(bytes, ttl)).await
        }
    }

    /// Deletes the value stored under `key`, reporting whether one was
    /// present.
    fn delete(&self, key: &CacheKey) -> impl Future<Output = BackendResult<bool>> + Send {
        async move { Ok(self.remove(key).await?.was_deleted()) }
    }

    /// Empties the store.
    fn clear_all(&self) -> impl Future<Output = BackendResult<()>> + Send {
        self.clear()
    }
}

impl<B> CacheStore for B where B: Backend {}
