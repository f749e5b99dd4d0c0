//! Integration tests for the response cache in front of GET handlers.
//!
//! The database is unreachable in these tests, so a successful response
//! can only have come from the cache.

mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use chrono::Utc;
use common::{body_json, cache_status, get, send_json};
use loyalty_cache::{CacheBackend, InMemoryCacheBackend};
use loyalty_db::models::tier::Tier;
use serde_json::json;

fn tier(id: i64, name: &str) -> Tier {
    Tier {
        id,
        name: name.to_string(),
        points_required: 1000,
        description: vec!["Priority support".to_string()],
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

async fn seed<T: serde::Serialize>(cache: &InMemoryCacheBackend, key: &str, value: &T) {
    let bytes = serde_json::to_vec(value).unwrap();
    cache.set(key, &bytes, 60).await.unwrap();
}

// ---------------------------------------------------------------------------
// Test: cached tier is served with HIT and without touching the database
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cached_tier_is_served_as_hit() {
    let cache = Arc::new(InMemoryCacheBackend::new());
    seed(&cache, "cache:tier:1", &tier(1, "Gold")).await;
    let app = common::build_test_app(cache);

    let response = get(app, "/api/v1/tiers/1").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(cache_status(&response), Some("HIT"));
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Gold");
    assert_eq!(json["data"]["points_required"], 1000);
}

// ---------------------------------------------------------------------------
// Test: listing keys include the canonical query string
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tier_listing_hit_uses_empty_query_key() {
    let cache = Arc::new(InMemoryCacheBackend::new());
    seed(&cache, "cache:tiers:", &vec![tier(1, "Gold"), tier(2, "Silver")]).await;
    let app = common::build_test_app(cache);

    let response = get(app, "/api/v1/tiers").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(cache_status(&response), Some("HIT"));
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn criteria_listing_key_ignores_parameter_order() {
    let cache = Arc::new(InMemoryCacheBackend::new());
    seed(
        &cache,
        "cache:eligibility_criteria:active_only=true&tier_id=3",
        &Vec::<serde_json::Value>::new(),
    )
    .await;
    let app = common::build_test_app(cache);

    let response = get(app, "/api/v1/eligibility-criteria?tier_id=3&active_only=true").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(cache_status(&response), Some("HIT"));
}

// ---------------------------------------------------------------------------
// Test: failed computations are not cached
// ---------------------------------------------------------------------------

#[tokio::test]
async fn database_failure_on_miss_is_not_cached() {
    let cache = Arc::new(InMemoryCacheBackend::new());
    let app = common::build_test_app(cache.clone());

    let response = get(app, "/api/v1/tiers/2").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(cache_status(&response).is_none());
    assert!(!cache.contains_key("cache:tier:2"));
}

// ---------------------------------------------------------------------------
// Test: a write that fails leaves the cache untouched
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_write_does_not_invalidate() {
    let cache = Arc::new(InMemoryCacheBackend::new());
    seed(&cache, "cache:tier:1", &tier(1, "Gold")).await;
    seed(&cache, "cache:tiers:", &vec![tier(1, "Gold")]).await;
    let app = common::build_test_app(cache.clone());

    let response = send_json(
        app,
        Method::PUT,
        "/api/v1/tiers/1",
        json!({ "name": "Platinum" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(cache.contains_key("cache:tier:1"));
    assert!(cache.contains_key("cache:tiers:"));
}
