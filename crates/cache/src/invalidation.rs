//! Cache invalidation coordinator.
//!
//! Handlers call [`CacheInvalidator::apply`] after their write commits and
//! before responding. Exact-key deletes and pattern sweeps run
//! independently; a failure in one does not skip the other. Nothing here
//! returns an error: failures and timeouts are logged and counted in the
//! [`InvalidationReport`].
//!
//! A key delete is one round trip and gets the per-call timeout. A sweep
//! may walk the keyspace in many batches, so it gets its own larger budget
//! and relies on the backend to bound each batch.

use std::sync::Arc;
use std::time::Duration;

use loyalty_core::cache_keys::Invalidation;
use serde::Serialize;

use crate::backend::CacheBackend;
use crate::{DEFAULT_CACHE_IO_TIMEOUT, DEFAULT_SWEEP_TIMEOUT};

/// What one invalidation call achieved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InvalidationReport {
    /// Exact keys that existed and were removed.
    pub keys_deleted: u64,
    /// Keys removed by pattern sweeps.
    pub pattern_deleted: u64,
    /// Backend calls that failed or timed out.
    pub failures: u32,
}

impl InvalidationReport {
    pub fn is_clean(&self) -> bool {
        self.failures == 0
    }

    pub fn total_deleted(&self) -> u64 {
        self.keys_deleted + self.pattern_deleted
    }

    fn merge(&mut self, other: InvalidationReport) {
        self.keys_deleted += other.keys_deleted;
        self.pattern_deleted += other.pattern_deleted;
        self.failures += other.failures;
    }
}

/// Removes stale response-cache entries after writes.
#[derive(Clone)]
pub struct CacheInvalidator {
    backend: Arc<dyn CacheBackend>,
    io_timeout: Duration,
    sweep_timeout: Duration,
}

impl CacheInvalidator {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            io_timeout: DEFAULT_CACHE_IO_TIMEOUT,
            sweep_timeout: DEFAULT_SWEEP_TIMEOUT,
        }
    }

    /// Override the per-call timeout for exact-key deletes.
    pub fn with_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    /// Override the budget for one whole pattern sweep.
    pub fn with_sweep_timeout(mut self, sweep_timeout: Duration) -> Self {
        self.sweep_timeout = sweep_timeout;
        self
    }

    /// Delete `key` and sweep `pattern`, either of which may be absent.
    pub async fn invalidate(&self, key: Option<&str>, pattern: Option<&str>) -> InvalidationReport {
        let (by_key, by_pattern) = tokio::join!(
            async {
                match key {
                    Some(key) => self.delete_key(key).await,
                    None => InvalidationReport::default(),
                }
            },
            async {
                match pattern {
                    Some(pattern) => self.sweep(pattern).await,
                    None => InvalidationReport::default(),
                }
            },
        );

        let mut report = by_key;
        report.merge(by_pattern);
        report
    }

    /// Apply every key and pattern a write declared stale.
    pub async fn apply(&self, invalidation: &Invalidation) -> InvalidationReport {
        let mut report = InvalidationReport::default();

        for key in invalidation.key_strings() {
            report.merge(self.delete_key(&key).await);
        }
        for pattern in invalidation.pattern_strings() {
            report.merge(self.sweep(&pattern).await);
        }

        tracing::debug!(
            keys = invalidation.keys.len(),
            patterns = invalidation.patterns.len(),
            deleted = report.total_deleted(),
            failures = report.failures,
            "Cache invalidation applied"
        );
        report
    }

    async fn delete_key(&self, key: &str) -> InvalidationReport {
        let mut report = InvalidationReport::default();

        match tokio::time::timeout(self.io_timeout, self.backend.delete(key)).await {
            Ok(Ok(true)) => report.keys_deleted = 1,
            Ok(Ok(false)) => {}
            Ok(Err(e)) => {
                tracing::warn!(key, error = %e, "Cache key invalidation failed");
                report.failures = 1;
            }
            Err(_) => {
                tracing::warn!(
                    key,
                    timeout_ms = self.io_timeout.as_millis() as u64,
                    "Cache key invalidation timed out"
                );
                report.failures = 1;
            }
        }
        report
    }

    async fn sweep(&self, pattern: &str) -> InvalidationReport {
        let mut report = InvalidationReport::default();

        let sweep = self.backend.delete_by_pattern(pattern);
        match tokio::time::timeout(self.sweep_timeout, sweep).await {
            Ok(Ok(deleted)) => report.pattern_deleted = deleted,
            Ok(Err(e)) => {
                tracing::warn!(pattern, error = %e, "Cache pattern invalidation failed");
                report.failures = 1;
            }
            Err(_) => {
                tracing::warn!(
                    pattern,
                    timeout_ms = self.sweep_timeout.as_millis() as u64,
                    "Cache pattern invalidation timed out"
                );
                report.failures = 1;
            }
        }
        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use loyalty_core::cache_keys::{CacheQuery, CacheResource};

    use super::*;
    use crate::memory::InMemoryCacheBackend;
    use crate::testing::{BatchedSweepBackend, FailingBackend, HangingBackend};

    async fn seeded() -> Arc<InMemoryCacheBackend> {
        let backend = Arc::new(InMemoryCacheBackend::new());
        for key in [
            "cache:tier:1",
            "cache:tier:2",
            "cache:tiers:",
            "cache:tiers:page=2",
            "cache:customers:",
        ] {
            backend.set(key, b"{}", 60).await.unwrap();
        }
        backend
    }

    // -- invalidate -----------------------------------------------------------

    #[tokio::test]
    async fn key_and_pattern_are_both_applied() {
        let backend = seeded().await;
        let invalidator = CacheInvalidator::new(backend.clone());

        let report = invalidator
            .invalidate(Some("cache:tier:1"), Some("cache:tiers:*"))
            .await;

        assert_eq!(report.keys_deleted, 1);
        assert_eq!(report.pattern_deleted, 2);
        assert!(report.is_clean());
        assert!(!backend.contains_key("cache:tier:1"));
        assert!(backend.contains_key("cache:tier:2"));
        assert!(backend.contains_key("cache:customers:"));
    }

    #[tokio::test]
    async fn invalidating_absent_key_is_clean_noop() {
        let backend = seeded().await;
        let invalidator = CacheInvalidator::new(backend.clone());

        let report = invalidator.invalidate(Some("cache:tier:999"), None).await;

        assert_eq!(report, InvalidationReport::default());
        assert_eq!(backend.len(), 5);
    }

    #[tokio::test]
    async fn invalidation_is_idempotent() {
        let backend = seeded().await;
        let invalidator = CacheInvalidator::new(backend.clone());

        invalidator
            .invalidate(Some("cache:tier:1"), Some("cache:tiers:*"))
            .await;
        let after_first = backend.len();
        let second = invalidator
            .invalidate(Some("cache:tier:1"), Some("cache:tiers:*"))
            .await;

        assert_eq!(backend.len(), after_first);
        assert_eq!(second.total_deleted(), 0);
        assert!(second.is_clean());
    }

    #[tokio::test]
    async fn neither_key_nor_pattern_does_nothing() {
        let backend = seeded().await;
        let invalidator = CacheInvalidator::new(backend.clone());
        assert_eq!(invalidator.invalidate(None, None).await, InvalidationReport::default());
        assert_eq!(backend.len(), 5);
    }

    // -- failure handling -----------------------------------------------------

    #[tokio::test]
    async fn backend_failures_are_counted_not_raised() {
        let backend = Arc::new(FailingBackend::default());
        let invalidator = CacheInvalidator::new(backend.clone());

        let report = invalidator
            .invalidate(Some("cache:tier:1"), Some("cache:tiers:*"))
            .await;

        assert_eq!(report.failures, 2);
        assert_eq!(report.total_deleted(), 0);
    }

    #[tokio::test]
    async fn hung_backend_times_out() {
        let invalidator = CacheInvalidator::new(Arc::new(HangingBackend::default()))
            .with_timeout(Duration::from_millis(20))
            .with_sweep_timeout(Duration::from_millis(40));

        let report = invalidator
            .invalidate(Some("cache:tier:1"), Some("cache:tiers:*"))
            .await;

        assert_eq!(report.failures, 2);
    }

    #[tokio::test]
    async fn multi_batch_sweep_outlasts_per_call_timeout() {
        let backend = Arc::new(BatchedSweepBackend::new(6, Duration::from_millis(15)));
        let invalidator =
            CacheInvalidator::new(backend.clone()).with_timeout(Duration::from_millis(25));

        let report = invalidator.invalidate(None, Some("cache:tiers:*")).await;

        assert!(report.is_clean());
        assert_eq!(report.pattern_deleted, 6);
        assert_eq!(backend.batches_done(), 6);
    }

    #[tokio::test]
    async fn sweep_budget_cuts_off_an_endless_walk() {
        let backend = Arc::new(BatchedSweepBackend::new(1_000, Duration::from_millis(10)));
        let invalidator =
            CacheInvalidator::new(backend.clone()).with_sweep_timeout(Duration::from_millis(50));

        let report = invalidator.invalidate(None, Some("cache:tiers:*")).await;

        assert_eq!(report.failures, 1);
        assert!(backend.batches_done() < 1_000);
    }

    // -- apply ----------------------------------------------------------------

    #[tokio::test]
    async fn tier_write_clears_tier_and_all_listings() {
        let backend = seeded().await;
        let invalidator = CacheInvalidator::new(backend.clone());

        let report = invalidator.apply(&Invalidation::tier_write(1)).await;

        assert_eq!(report.keys_deleted, 1);
        assert_eq!(report.pattern_deleted, 2);
        assert!(!backend.contains_key(&CacheResource::Tier(1).key()));
        assert!(!backend.contains_key(&CacheResource::Tiers(CacheQuery::default()).key()));
        assert!(backend.contains_key(&CacheResource::Tier(2).key()));
    }
}
