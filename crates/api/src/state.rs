use std::sync::Arc;
use std::time::Duration;

use loyalty_cache::{CacheBackend, CacheInvalidator, ResponseCache};
use loyalty_core::eligibility::EligibilityEvaluator;
use loyalty_db::adapters::{PgCriteriaStore, PgLedgerReader};
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: loyalty_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Store behind the gate and invalidator, kept for health reports.
    pub cache_backend: Arc<dyn CacheBackend>,
    /// Read-through gate for cacheable GET handlers.
    pub cache: ResponseCache,
    /// Clears stale cache entries after writes.
    pub invalidator: CacheInvalidator,
    /// Evaluates customers against tier criteria.
    pub evaluator: Arc<EligibilityEvaluator<PgLedgerReader>>,
    /// Resolves which criteria apply to a tier.
    pub criteria_store: PgCriteriaStore,
    /// Cancelled when the server begins shutting down.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Wire the cache gate, invalidator and evaluator from configuration.
    pub fn new(
        pool: loyalty_db::DbPool,
        config: ServerConfig,
        cache_backend: Arc<dyn CacheBackend>,
    ) -> Self {
        let cache = ResponseCache::new(Arc::clone(&cache_backend), config.cache_ttl_secs)
            .with_timeout(config.cache_io_timeout());
        let invalidator = CacheInvalidator::new(Arc::clone(&cache_backend))
            .with_timeout(config.cache_io_timeout())
            .with_sweep_timeout(config.cache_sweep_timeout());
        let evaluator = EligibilityEvaluator::new(PgLedgerReader::new(pool.clone()))
            .with_timeout(Duration::from_secs(config.ledger_timeout_secs));

        Self {
            criteria_store: PgCriteriaStore::new(pool.clone()),
            pool,
            config: Arc::new(config),
            cache_backend,
            cache,
            invalidator,
            evaluator: Arc::new(evaluator),
            shutdown: CancellationToken::new(),
        }
    }
}
