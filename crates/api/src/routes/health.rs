use axum::extract::State;
use axum::{routing::get, Json, Router};
use loyalty_cache::CacheBackend;
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when every dependency answers, otherwise `degraded`.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    pub db_healthy: bool,
    pub cache: CacheHealth,
}

/// Which response-cache store is in use and whether it answers.
#[derive(Serialize)]
pub struct CacheHealth {
    /// `redis` or `memory`.
    pub backend: &'static str,
    pub healthy: bool,
}

/// GET /health -- database and response-cache reachability.
///
/// A dead cache only degrades the service: reads fall through to the
/// database and writes still succeed.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache_ping =
        tokio::time::timeout(state.config.cache_io_timeout(), state.cache_backend.ping());
    let (db, cache) = tokio::join!(loyalty_db::health_check(&state.pool), cache_ping);

    let db_healthy = db.is_ok();
    let cache_healthy = matches!(cache, Ok(Ok(())));
    if !cache_healthy {
        tracing::warn!(backend = state.cache_backend.kind(), "Cache health check failed");
    }

    Json(HealthResponse {
        status: if db_healthy && cache_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        cache: CacheHealth {
            backend: state.cache_backend.kind(),
            healthy: cache_healthy,
        },
    })
}

/// Mount health check routes (root level, not under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
