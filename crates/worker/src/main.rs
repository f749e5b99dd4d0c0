use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loyalty_cache::CacheInvalidator;
use loyalty_core::eligibility::EligibilityEvaluator;
use loyalty_core::schedule::Schedule;
use loyalty_db::adapters::{PgCriteriaStore, PgLedgerReader, PgMembershipStore};
use loyalty_worker::config::WorkerConfig;
use loyalty_worker::scheduler::ScheduledJob;
use loyalty_worker::tier_downgrade::TierDowngradeJob;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loyalty_worker=debug,loyalty_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = WorkerConfig::from_env();
    tracing::info!(run_on_start = config.run_on_start, "Loaded worker configuration");

    // --- Database ---
    let pool = loyalty_db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    loyalty_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database connection pool ready");

    // --- Cache ---
    let cache_backend = loyalty_cache::connect_or_fallback(&config.cache_connect_options()).await;
    let invalidator = CacheInvalidator::new(cache_backend)
        .with_timeout(config.cache_io_timeout())
        .with_sweep_timeout(config.cache_sweep_timeout());

    // --- Jobs ---
    let downgrade = Arc::new(TierDowngradeJob::new(
        PgMembershipStore::new(pool.clone()),
        PgCriteriaStore::new(pool.clone()),
        EligibilityEvaluator::new(PgLedgerReader::new(pool)).with_timeout(config.ledger_timeout()),
        invalidator,
    ));

    let run_downgrade = move |cancel: CancellationToken| {
        let job = Arc::clone(&downgrade);
        async move { job.run_scheduled(cancel).await }
    };
    let downgrade_job = if config.run_on_start {
        ScheduledJob::start_with_initial_run("tier-downgrade", Schedule::Monthly, run_downgrade)
    } else {
        ScheduledJob::start("tier-downgrade", Schedule::Monthly, run_downgrade)
    };

    shutdown_signal().await;
    downgrade_job.shutdown().await;

    tracing::info!("Worker shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, stopping worker"),
        () = terminate => tracing::info!("Received SIGTERM, stopping worker"),
    }
}
