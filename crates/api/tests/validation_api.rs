//! Integration tests for request validation that runs before any database access.

mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use common::{body_json, send_json};
use loyalty_cache::InMemoryCacheBackend;
use serde_json::json;

fn app() -> axum::Router {
    common::build_test_app(Arc::new(InMemoryCacheBackend::new()))
}

#[tokio::test]
async fn create_tier_rejects_negative_points() {
    let response = send_json(
        app(),
        Method::POST,
        "/api/v1/tiers",
        json!({ "name": "Gold", "points_required": -1 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn create_tier_rejects_blank_name() {
    let response = send_json(
        app(),
        Method::POST,
        "/api/v1/tiers",
        json!({ "name": "  ", "points_required": 100 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_criteria_rejects_zero_consecutive_periods() {
    let response = send_json(
        app(),
        Method::POST,
        "/api/v1/eligibility-criteria",
        json!({
            "tier_id": 1,
            "net_earning_required": 100,
            "evaluation_period_days": 30,
            "consecutive_periods_required": 0
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn create_criteria_rejects_excessive_lookback() {
    let response = send_json(
        app(),
        Method::POST,
        "/api/v1/eligibility-criteria",
        json!({
            "tier_id": 1,
            "net_earning_required": 100,
            "evaluation_period_days": 365,
            "consecutive_periods_required": 12
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("exceeds maximum"));
}
