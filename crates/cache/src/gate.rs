//! Read-through response cache for GET handlers.
//!
//! On a hit the cached value is returned and the computation is skipped.
//! On a miss the computation runs and, only if it succeeds, its result is
//! stored with a TTL. A read that times out bypasses the cache entirely
//! so a slow backend degrades to uncached reads rather than slower ones.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use loyalty_core::cache_keys::CacheResource;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backend::{CacheBackend, CacheBackendError};
use crate::DEFAULT_CACHE_IO_TIMEOUT;

/// Response header reporting how a GET was served.
pub const CACHE_STATUS_HEADER: &str = "x-cache-status";

/// How a value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from cache; the computation did not run.
    Hit,
    /// Computed, and stored if the store succeeded.
    Miss,
    /// Computed without consulting or populating the cache.
    Bypass,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
            Self::Bypass => "BYPASS",
        }
    }
}

/// A value together with how it was served.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    pub status: CacheStatus,
}

/// The gate in front of cacheable reads.
#[derive(Clone)]
pub struct ResponseCache {
    backend: Arc<dyn CacheBackend>,
    default_ttl_secs: u64,
    io_timeout: Duration,
}

impl ResponseCache {
    pub fn new(backend: Arc<dyn CacheBackend>, default_ttl_secs: u64) -> Self {
        Self {
            backend,
            default_ttl_secs: default_ttl_secs.max(1),
            io_timeout: DEFAULT_CACHE_IO_TIMEOUT,
        }
    }

    /// Override the per-call timeout for cache reads and writes.
    pub fn with_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    pub fn default_ttl_secs(&self) -> u64 {
        self.default_ttl_secs
    }

    /// [`get_or_compute`](Self::get_or_compute) keyed by a registry resource
    /// with the default TTL.
    pub async fn cached<T, E, F, Fut>(
        &self,
        resource: &CacheResource,
        compute: F,
    ) -> Result<Cached<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.get_or_compute(&resource.key(), self.default_ttl_secs, compute)
            .await
    }

    /// Return the cached value for `key`, or run `compute` and cache its
    /// `Ok` result for `ttl_secs`. Errors from `compute` pass through
    /// unchanged and are never cached.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &str,
        ttl_secs: u64,
        compute: F,
    ) -> Result<Cached<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let store_result = match tokio::time::timeout(self.io_timeout, self.backend.get(key)).await
        {
            Ok(Ok(Some(bytes))) => match serde_json::from_slice::<T>(&bytes) {
                Ok(value) => {
                    tracing::debug!(key, "Cache hit");
                    return Ok(Cached {
                        value,
                        status: CacheStatus::Hit,
                    });
                }
                Err(e) => {
                    tracing::warn!(key, error = %e, "Discarding undecodable cache entry");
                    true
                }
            },
            Ok(Ok(None)) => true,
            Ok(Err(e)) => {
                tracing::warn!(key, error = %e, "Cache read failed");
                true
            }
            Err(_) => {
                tracing::warn!(
                    key,
                    timeout_ms = self.io_timeout.as_millis() as u64,
                    "Cache read timed out, bypassing cache"
                );
                false
            }
        };

        let value = compute().await?;

        if !store_result {
            return Ok(Cached {
                value,
                status: CacheStatus::Bypass,
            });
        }

        if let Err(e) = self.store(key, &value, ttl_secs).await {
            tracing::warn!(key, error = %e, "Cache store failed");
        } else {
            tracing::debug!(key, ttl_secs, "Cache miss stored");
        }

        Ok(Cached {
            value,
            status: CacheStatus::Miss,
        })
    }

    async fn store<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: u64,
    ) -> Result<(), CacheBackendError> {
        let bytes =
            serde_json::to_vec(value).map_err(|e| CacheBackendError::Serialization(e.to_string()))?;

        tokio::time::timeout(self.io_timeout, self.backend.set(key, &bytes, ttl_secs.max(1)))
            .await
            .map_err(|_| CacheBackendError::Command("set timed out".into()))?
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
