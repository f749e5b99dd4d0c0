//! Cache storage port.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

/// A cache operation failed.
#[derive(Debug, thiserror::Error)]
pub enum CacheBackendError {
    #[error("Cache connection failed: {0}")]
    Connection(String),

    #[error("Cache command failed: {0}")]
    Command(String),

    #[error("Cache payload serialization failed: {0}")]
    Serialization(String),

    #[error("Cache round trip timed out after {0:?}")]
    TimedOut(Duration),
}

impl From<redis::RedisError> for CacheBackendError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
            Self::Connection(err.to_string())
        } else {
            Self::Command(err.to_string())
        }
    }
}

/// Key/value store holding serialized responses with a TTL.
///
/// Implementations are shared across request handlers and must be
/// internally synchronized.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// The stored bytes for `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheBackendError>;

    /// Store `value` under `key`, expiring after `ttl_secs` seconds.
    async fn set(&self, key: &str, value: &[u8], ttl_secs: u64) -> Result<(), CacheBackendError>;

    /// Remove `key`. Returns `true` if it existed.
    async fn delete(&self, key: &str) -> Result<bool, CacheBackendError>;

    /// Remove every key matching the glob `pattern`. Returns the count removed.
    async fn delete_by_pattern(&self, pattern: &str) -> Result<u64, CacheBackendError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), CacheBackendError> {
        Ok(())
    }

    /// Short backend name for health reports.
    fn kind(&self) -> &'static str;
}

#[async_trait]
impl<T: CacheBackend + ?Sized> CacheBackend for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheBackendError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &[u8], ttl_secs: u64) -> Result<(), CacheBackendError> {
        (**self).set(key, value, ttl_secs).await
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheBackendError> {
        (**self).delete(key).await
    }

    async fn delete_by_pattern(&self, pattern: &str) -> Result<u64, CacheBackendError> {
        (**self).delete_by_pattern(pattern).await
    }

    async fn ping(&self) -> Result<(), CacheBackendError> {
        (**self).ping().await
    }

    fn kind(&self) -> &'static str {
        (**self).kind()
    }
}
