//! Backend doubles shared by the gate and invalidator tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::backend::{CacheBackend, CacheBackendError};

/// Every call fails with a connection error.
#[derive(Default)]
pub struct FailingBackend {
    pub calls: AtomicUsize,
}

impl FailingBackend {
    fn fail<T>(&self) -> Result<T, CacheBackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheBackendError::Connection("connection refused".into()))
    }
}

#[async_trait]
impl CacheBackend for FailingBackend {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheBackendError> {
        self.fail()
    }

    async fn set(&self, _key: &str, _value: &[u8], _ttl: u64) -> Result<(), CacheBackendError> {
        self.fail()
    }

    async fn delete(&self, _key: &str) -> Result<bool, CacheBackendError> {
        self.fail()
    }

    async fn delete_by_pattern(&self, _pattern: &str) -> Result<u64, CacheBackendError> {
        self.fail()
    }

    async fn ping(&self) -> Result<(), CacheBackendError> {
        self.fail()
    }

    fn kind(&self) -> &'static str {
        "failing"
    }
}

/// Every call sleeps far longer than any test timeout.
#[derive(Default)]
pub struct HangingBackend {
    pub sets: AtomicUsize,
}

async fn hang() {
    tokio::time::sleep(Duration::from_secs(3600)).await;
}

#[async_trait]
impl CacheBackend for HangingBackend {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheBackendError> {
        hang().await;
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &[u8], _ttl: u64) -> Result<(), CacheBackendError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        hang().await;
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<bool, CacheBackendError> {
        hang().await;
        Ok(false)
    }

    async fn delete_by_pattern(&self, _pattern: &str) -> Result<u64, CacheBackendError> {
        hang().await;
        Ok(0)
    }

    fn kind(&self) -> &'static str {
        "hanging"
    }
}

/// Pattern sweeps walk `batches` slow round trips, deleting one key each,
/// like a cursor scan over a large keyspace. Other calls succeed at once.
pub struct BatchedSweepBackend {
    batches: u32,
    per_batch: Duration,
    done: AtomicUsize,
}

impl BatchedSweepBackend {
    pub fn new(batches: u32, per_batch: Duration) -> Self {
        Self {
            batches,
            per_batch,
            done: AtomicUsize::new(0),
        }
    }

    pub fn batches_done(&self) -> usize {
        self.done.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheBackend for BatchedSweepBackend {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheBackendError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &[u8], _ttl: u64) -> Result<(), CacheBackendError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<bool, CacheBackendError> {
        Ok(false)
    }

    async fn delete_by_pattern(&self, _pattern: &str) -> Result<u64, CacheBackendError> {
        let mut deleted = 0;
        for _ in 0..self.batches {
            tokio::time::sleep(self.per_batch).await;
            self.done.fetch_add(1, Ordering::SeqCst);
            deleted += 1;
        }
        Ok(deleted)
    }

    fn kind(&self) -> &'static str {
        "batched"
    }
}
