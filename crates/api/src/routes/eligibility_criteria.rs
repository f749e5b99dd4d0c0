//! Route definitions for tier eligibility criteria.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::eligibility_criteria;
use crate::state::AppState;

/// Criteria CRUD routes, mounted at `/eligibility-criteria`.
///
/// ```text
/// GET    /       -> list_criteria
/// POST   /       -> create_criteria
/// PUT    /{id}   -> update_criteria
/// DELETE /{id}   -> delete_criteria
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(eligibility_criteria::list_criteria).post(eligibility_criteria::create_criteria),
        )
        .route(
            "/{id}",
            put(eligibility_criteria::update_criteria).delete(eligibility_criteria::delete_criteria),
        )
}
