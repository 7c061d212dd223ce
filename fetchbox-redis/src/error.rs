//! Error types for redis backend operations.

use fetchbox_backend::BackendError;
use redis::RedisError;

/// Error type for redis backend operations.
///
/// Wraps errors from the underlying [`redis`] crate. Connection-flavored
/// failures convert to [`BackendError::Connection`] so callers can tell
/// "backend unavailable" apart from protocol or state errors; everything
/// else converts to [`BackendError::Internal`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error from the underlying redis client.
    #[error("redis backend error: {0}")]
    Redis(#[from] RedisError),
}

impl From<Error> for BackendError {
    fn from(error: Error) -> Self {
        let Error::Redis(redis_error) = &error;
        if redis_error.is_io_error()
            || redis_error.is_timeout()
            || redis_error.is_connection_refusal()
            || redis_error.is_connection_dropped()
        {
            BackendError::Connection(Box::new(error))
        } else {
            BackendError::Internal(Box::new(error))
        }
    }
}
