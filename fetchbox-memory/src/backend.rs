//! Map-backed backend implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use fetchbox_backend::{Backend, BackendResult, DeleteStatus};
use fetchbox_core::{CacheEntry, CacheKey};
use tokio::task::JoinHandle;
use tracing::trace;

/// In-process cache backend.
///
/// Entries live in a concurrent map; every entry stored with a bounded
/// ttl owns an eviction timer that removes it when the deadline passes.
/// Eviction is generation-guarded: each write stamps its entry with a
/// fresh generation, and a firing timer only removes the entry it was
/// armed for. A timer that outlives its entry — the key was replaced,
/// deleted, or the store was cleared and re-populated — is a no-op.
///
/// Reads additionally discard entries whose deadline has already passed,
/// so stale data is never observable even before the timer fires.
///
/// Requires a running tokio runtime; timers are tokio tasks.
///
/// # Examples
///
/// ```
/// use fetchbox_memory::MemoryBackend;
/// use fetchbox_backend::CacheStore;
/// use fetchbox_core::CacheKey;
/// use std::time::Duration;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let backend = MemoryBackend::new();
/// let key = CacheKey::new("greeting");
/// backend.set(&key, &"hello", Some(Duration::from_secs(60))).await.unwrap();
/// let value: Option<String> = backend.get(&key).await.unwrap();
/// assert_eq!(value.as_deref(), Some("hello"));
/// # });
/// ```
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
    name: String,
}

#[derive(Default)]
struct Inner {
    entries: DashMap<CacheKey, StoredEntry>,
    generation: AtomicU64,
}

struct StoredEntry {
    entry: CacheEntry<Bytes>,
    generation: u64,
    eviction: Option<JoinHandle<()>>,
}

impl StoredEntry {
    /// Cancels the pending eviction timer. Idempotent: aborting an
    /// already-finished or already-cancelled timer is a no-op.
    fn abort_eviction(&mut self) {
        if let Some(handle) = self.eviction.take() {
            handle.abort();
        }
    }
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::with_name("memory")
    }

    /// Creates an empty backend with a custom name for logging.
    pub fn with_name(name: impl Into<String>) -> Self {
        MemoryBackend {
            inner: Arc::new(Inner::default()),
            name: name.into(),
        }
    }

    /// Number of entries currently held, expired-but-unevicted included.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    fn arm_eviction(&self, key: &CacheKey, entry: &CacheEntry<Bytes>, generation: u64) -> Option<JoinHandle<()>> {
        entry.expires_at()?;
        // Remaining ttl is zero for entries that are already expired at
        // write time; their timer fires on the next tick.
        let delay = entry.ttl().unwrap_or(Duration::ZERO);
        let inner = Arc::clone(&self.inner);
        let key = key.clone();
        Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Only remove the entry this timer was armed for. Dropping the
            // removed StoredEntry detaches its own handle.
            let removed = inner
                .entries
                .remove_if(&key, |_, stored| stored.generation == generation);
            if removed.is_some() {
                trace!(%key, generation, "eviction timer removed entry");
            }
        }))
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("name", &self.name)
            .field("entries", &self.inner.entries.len())
            .finish()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry<Bytes>>> {
        let expired_generation = match self.inner.entries.get(key) {
            None => return Ok(None),
            Some(stored) if !stored.entry.is_expired() => {
                return Ok(Some(stored.entry.clone()));
            }
            Some(stored) => stored.generation,
        };
        // Lazy expiration: the deadline passed but the timer has not fired
        // yet. Remove exactly the entry we observed.
        if let Some((_, mut stored)) = self
            .inner
            .entries
            .remove_if(key, |_, stored| stored.generation == expired_generation)
        {
            stored.abort_eviction();
            trace!(%key, "discarded stale entry on read");
        }
        Ok(None)
    }

    async fn write(&self, key: &CacheKey, entry: CacheEntry<Bytes>) -> BackendResult<()> {
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed);
        let eviction = self.arm_eviction(key, &entry, generation);
        let stored = StoredEntry {
            entry,
            generation,
            eviction,
        };
        if let Some(mut prev) = self.inner.entries.insert(key.clone(), stored) {
            prev.abort_eviction();
        }
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        match self.inner.entries.remove(key) {
            Some((_, mut stored)) => {
                stored.abort_eviction();
                Ok(DeleteStatus::Deleted)
            }
            None => Ok(DeleteStatus::Missing),
        }
    }

    async fn clear(&self) -> BackendResult<()> {
        self.inner.entries.retain(|_, stored| {
            stored.abort_eviction();
            false
        });
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
