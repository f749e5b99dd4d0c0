//! Redis cache backend.
//!
//! Values are plain strings written with `SET .. EX`. Pattern deletes walk
//! the keyspace with cursor-based `SCAN MATCH .. COUNT` and delete each
//! batch, so a sweep never blocks the server the way `KEYS` would. Every
//! round trip, including each `SCAN` and `DEL` of a sweep, is bounded by
//! its own timeout.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};

use crate::backend::{CacheBackend, CacheBackendError};
use crate::DEFAULT_CACHE_IO_TIMEOUT;

/// Keys requested per `SCAN` round trip.
pub const DEFAULT_SCAN_COUNT: usize = 500;

/// Cache backend over a multiplexed, auto-reconnecting Redis connection.
#[derive(Clone)]
pub struct RedisCacheBackend {
    connection: ConnectionManager,
    scan_count: usize,
    round_trip_timeout: Duration,
}

impl RedisCacheBackend {
    /// Connect to the Redis server at `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> Result<Self, CacheBackendError> {
        let client = Client::open(url).map_err(|e| CacheBackendError::Connection(e.to_string()))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheBackendError::Connection(e.to_string()))?;

        tracing::info!("Redis cache backend connected");
        Ok(Self {
            connection,
            scan_count: DEFAULT_SCAN_COUNT,
            round_trip_timeout: DEFAULT_CACHE_IO_TIMEOUT,
        })
    }

    /// Override the `SCAN` batch size.
    pub fn with_scan_count(mut self, scan_count: usize) -> Self {
        self.scan_count = scan_count.max(1);
        self
    }

    /// Override the timeout applied to each command.
    pub fn with_round_trip_timeout(mut self, timeout: Duration) -> Self {
        self.round_trip_timeout = timeout;
        self
    }

    async fn bounded<T>(
        &self,
        command: impl Future<Output = Result<T, RedisError>>,
    ) -> Result<T, CacheBackendError> {
        match tokio::time::timeout(self.round_trip_timeout, command).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(CacheBackendError::TimedOut(self.round_trip_timeout)),
        }
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheBackendError> {
        let mut conn = self.connection.clone();
        let value: Option<Vec<u8>> = self.bounded(conn.get(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8], ttl_secs: u64) -> Result<(), CacheBackendError> {
        let mut conn = self.connection.clone();
        let _: () = self.bounded(conn.set_ex(key, value, ttl_secs.max(1))).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheBackendError> {
        let mut conn = self.connection.clone();
        let removed: u64 = self.bounded(conn.del(key)).await?;
        Ok(removed > 0)
    }

    async fn delete_by_pattern(&self, pattern: &str) -> Result<u64, CacheBackendError> {
        let mut conn = self.connection.clone();
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;
        let mut batches: u32 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = self
                .bounded(
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(pattern)
                        .arg("COUNT")
                        .arg(self.scan_count)
                        .query_async(&mut conn),
                )
                .await?;
            batches += 1;

            if !keys.is_empty() {
                let removed: u64 = self
                    .bounded(redis::cmd("DEL").arg(&keys).query_async(&mut conn))
                    .await?;
                deleted += removed;
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        tracing::debug!(pattern, deleted, batches, "Redis pattern sweep complete");
        Ok(deleted)
    }

    async fn ping(&self) -> Result<(), CacheBackendError> {
        let mut conn = self.connection.clone();
        let _: String = self
            .bounded(redis::cmd("PING").query_async(&mut conn))
            .await?;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "redis"
    }
}
