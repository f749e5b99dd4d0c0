//! Response cache for the loyalty API.
//!
//! - [`backend`] -- the [`CacheBackend`] port and its error type.
//! - [`redis_backend`] / [`memory`] -- Redis and in-process backends.
//! - [`invalidation`] -- [`CacheInvalidator`], run after every write.
//! - [`gate`] -- [`ResponseCache`], the read-through gate for GET handlers.
//!
//! Neither the invalidator nor the gate ever surfaces a cache failure to
//! its caller; failures are logged and the request proceeds.

pub mod backend;
pub mod gate;
pub mod invalidation;
pub mod memory;
pub mod redis_backend;

use std::sync::Arc;
use std::time::Duration;

pub use backend::{CacheBackend, CacheBackendError};
pub use gate::{CacheStatus, Cached, ResponseCache, CACHE_STATUS_HEADER};
pub use invalidation::{CacheInvalidator, InvalidationReport};
pub use memory::InMemoryCacheBackend;
pub use redis_backend::RedisCacheBackend;

/// Default per-call timeout for cache I/O.
pub const DEFAULT_CACHE_IO_TIMEOUT: Duration = Duration::from_millis(250);

/// Default budget for a whole pattern sweep, which may take many round trips.
pub const DEFAULT_SWEEP_TIMEOUT: Duration = Duration::from_secs(5);

/// How [`connect_or_fallback`] reaches the cache store.
#[derive(Debug, Clone)]
pub struct CacheConnectOptions {
    /// Unset selects the in-process cache.
    pub redis_url: Option<String>,
    /// Keys requested per `SCAN` round trip.
    pub scan_count: usize,
    /// Timeout for each Redis command.
    pub round_trip_timeout: Duration,
}

impl Default for CacheConnectOptions {
    fn default() -> Self {
        Self {
            redis_url: None,
            scan_count: redis_backend::DEFAULT_SCAN_COUNT,
            round_trip_timeout: DEFAULT_CACHE_IO_TIMEOUT,
        }
    }
}

/// Redis when a URL is set and reachable, otherwise the in-process cache.
/// Never fails: an unreachable Redis is logged and replaced.
pub async fn connect_or_fallback(options: &CacheConnectOptions) -> Arc<dyn CacheBackend> {
    let Some(url) = options.redis_url.as_deref() else {
        tracing::info!("REDIS_URL not set, using in-memory cache");
        return Arc::new(InMemoryCacheBackend::new());
    };

    match RedisCacheBackend::connect(url).await {
        Ok(backend) => Arc::new(
            backend
                .with_scan_count(options.scan_count)
                .with_round_trip_timeout(options.round_trip_timeout),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable, falling back to in-memory cache");
            Arc::new(InMemoryCacheBackend::new())
        }
    }
}

#[cfg(test)]
mod testing;
