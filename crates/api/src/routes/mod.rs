pub mod eligibility_criteria;
pub mod health;
pub mod tiers;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /tiers                                   list, create
/// /tiers/{id}                              get, update, delete
/// /tiers/{id}/eligibility-criteria         criteria for one tier
/// /tiers/{id}/eligibility/{customer_id}    eligibility preview
///
/// /eligibility-criteria                    list, create
/// /eligibility-criteria/{id}               update, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/tiers", tiers::router())
        .nest("/eligibility-criteria", eligibility_criteria::router())
}
