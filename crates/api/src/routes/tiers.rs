//! Route definitions for loyalty tiers.

use axum::routing::get;
use axum::Router;

use crate::handlers::{eligibility, eligibility_criteria, tiers};
use crate::state::AppState;

/// Tier routes, mounted at `/tiers`.
///
/// ```text
/// GET    /                                -> list_tiers
/// POST   /                                -> create_tier
/// GET    /{id}                            -> get_tier
/// PUT    /{id}                            -> update_tier
/// DELETE /{id}                            -> delete_tier
/// GET    /{id}/eligibility-criteria       -> list_criteria_for_tier
/// GET    /{id}/eligibility/{customer_id}  -> preview_eligibility
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tiers::list_tiers).post(tiers::create_tier))
        .route(
            "/{id}",
            get(tiers::get_tier)
                .put(tiers::update_tier)
                .delete(tiers::delete_tier),
        )
        .route(
            "/{id}/eligibility-criteria",
            get(eligibility_criteria::list_criteria_for_tier),
        )
        .route(
            "/{id}/eligibility/{customer_id}",
            get(eligibility::preview_eligibility),
        )
}
