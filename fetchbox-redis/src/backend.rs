//! Redis backend implementation.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use fetchbox_backend::{Backend, BackendError, BackendResult, DeleteStatus};
use fetchbox_core::{CacheEntry, CacheKey};
use redis::{Client, aio::ConnectionManager};
use tokio::sync::OnceCell;
use tracing::trace;

use crate::error::Error;

/// Redis cache backend based on the redis-rs crate.
///
/// Stores each entry as a hash of the serialized envelope (`d`) and its
/// creation timestamp (`c`); a bounded ttl maps onto the key's own redis
/// expiry, and the expiration deadline is reconstructed from `PTTL` on
/// read. The connection is established lazily through a
/// [`ConnectionManager`], which queues and retries operations while the
/// backend is unreachable and fails them once its internal bounds are
/// exhausted — readiness gating is the manager's concern, not the
/// caller's.
///
/// # Examples
/// ```no_run
/// use fetchbox_redis::RedisBackend;
///
/// let backend = RedisBackend::builder()
///     .server("redis://127.0.0.1/")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct RedisBackend {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    name: String,
}

impl RedisBackend {
    /// Creates a backend with default settings.
    pub fn new() -> Result<Self, BackendError> {
        Ok(Self::builder().build()?)
    }

    /// Creates a builder with default settings.
    #[must_use]
    pub fn builder() -> RedisBackendBuilder {
        RedisBackendBuilder::default()
    }

    /// Lazily established connection manager.
    async fn connection(&self) -> Result<ConnectionManager, BackendError> {
        let manager = self
            .connection
            .get_or_try_init(|| {
                trace!("initializing redis connection manager");
                self.client.get_connection_manager()
            })
            .await
            .map_err(Error::from)?;
        Ok(manager.clone())
    }
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend")
            .field("name", &self.name)
            .finish()
    }
}

/// Builder for [`RedisBackend`].
pub struct RedisBackendBuilder {
    connection_info: String,
    name: String,
}

impl Default for RedisBackendBuilder {
    fn default() -> Self {
        Self {
            connection_info: "redis://127.0.0.1/".to_owned(),
            name: "redis".to_owned(),
        }
    }
}

impl RedisBackendBuilder {
    /// Sets connection info (host, port, database, credentials).
    pub fn server(mut self, connection_info: impl Into<String>) -> Self {
        self.connection_info = connection_info.into();
        self
    }

    /// Sets a custom name for this backend, used in logging.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Creates the backend with the configured settings.
    pub fn build(self) -> Result<RedisBackend, Error> {
        Ok(RedisBackend {
            client: Client::open(self.connection_info)?,
            connection: OnceCell::new(),
            name: self.name,
        })
    }
}

#[async_trait]
impl Backend for RedisBackend {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry<Bytes>>> {
        let mut con = self.connection().await?;

        // Pipeline: HMGET (data, created-at) + PTTL with typed decoding.
        let ((data, created_ms), pttl): ((Option<Vec<u8>>, Option<i64>), i64) = redis::pipe()
            .cmd("HMGET")
            .arg(key.as_str())
            .arg("d")
            .arg("c")
            .cmd("PTTL")
            .arg(key.as_str())
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;

        let data = match data {
            Some(data) => Bytes::from(data),
            None => return Ok(None),
        };

        let created_at = created_ms
            .and_then(DateTime::from_timestamp_millis)
            .unwrap_or_else(Utc::now);

        // PTTL returns -2 if the key doesn't exist, -1 if it has no
        // expiry, else the remaining milliseconds.
        let expires_at = (pttl > 0).then(|| Utc::now() + chrono::Duration::milliseconds(pttl));

        Ok(Some(CacheEntry::from_parts(data, created_at, expires_at)))
    }

    async fn write(&self, key: &CacheKey, entry: CacheEntry<Bytes>) -> BackendResult<()> {
        let mut con = self.connection().await?;

        let mut pipe = redis::pipe();
        pipe.cmd("HSET")
            .arg(key.as_str())
            .arg("d")
            .arg(entry.data().as_ref())
            .arg("c")
            .arg(entry.created_at().timestamp_millis())
            .ignore();
        if entry.expires_at().is_some() {
            // An entry that is already past its deadline still gets a
            // minimal expiry so it cannot outlive its metadata.
            let ttl_ms = entry
                .ttl()
                .map_or(1, |ttl| i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX).max(1));
            pipe.cmd("PEXPIRE").arg(key.as_str()).arg(ttl_ms).ignore();
        }

        pipe.query_async::<()>(&mut con).await.map_err(Error::from)?;
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        let mut con = self.connection().await?;

        let deleted: i64 = redis::cmd("DEL")
            .arg(key.as_str())
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;

        if deleted > 0 {
            Ok(DeleteStatus::Deleted)
        } else {
            Ok(DeleteStatus::Missing)
        }
    }

    async fn clear(&self) -> BackendResult<()> {
        let mut con = self.connection().await?;
        redis::cmd("FLUSHDB")
            .query_async::<()>(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
