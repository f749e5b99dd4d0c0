//! Handlers for tier eligibility criteria.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use loyalty_core::cache_keys::{CacheQuery, CacheResource, Invalidation};
use loyalty_core::error::CoreError;
use loyalty_core::types::DbId;
use loyalty_db::models::eligibility_criteria::{
    CreateEligibilityCriteria, CriteriaFilter, UpdateEligibilityCriteria,
};
use loyalty_db::repositories::EligibilityCriteriaRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::tiers::find_tier;
use crate::response::{cached_response, DataResponse};
use crate::state::AppState;

fn filter_query(filter: &CriteriaFilter) -> CacheQuery {
    let mut pairs = Vec::new();
    if let Some(tier_id) = filter.tier_id {
        pairs.push(("tier_id", tier_id.to_string()));
    }
    if let Some(app_type_id) = filter.app_type_id {
        pairs.push(("app_type_id", app_type_id.to_string()));
    }
    if let Some(active_only) = filter.active_only {
        pairs.push(("active_only", active_only.to_string()));
    }
    CacheQuery::from_pairs(pairs)
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "EligibilityCriteria",
        id,
    })
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /eligibility-criteria
pub async fn list_criteria(
    State(state): State<AppState>,
    Query(filter): Query<CriteriaFilter>,
) -> AppResult<Response> {
    let resource = CacheResource::EligibilityCriteria(filter_query(&filter));

    let cached = state
        .cache
        .cached(&resource, || async {
            EligibilityCriteriaRepo::list(&state.pool, &filter)
                .await
                .map_err(AppError::from)
        })
        .await?;

    Ok(cached_response(cached))
}

/// GET /tiers/{id}/eligibility-criteria
pub async fn list_criteria_for_tier(
    State(state): State<AppState>,
    Path(tier_id): Path<DbId>,
) -> AppResult<Response> {
    let filter = CriteriaFilter {
        tier_id: Some(tier_id),
        ..Default::default()
    };

    let cached = state
        .cache
        .cached(&CacheResource::EligibilityCriteriaForTier(tier_id), || async {
            EligibilityCriteriaRepo::list(&state.pool, &filter)
                .await
                .map_err(AppError::from)
        })
        .await?;

    Ok(cached_response(cached))
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// POST /eligibility-criteria
///
/// A second active record for the same tier and app type is a 409.
pub async fn create_criteria(
    State(state): State<AppState>,
    Json(input): Json<CreateEligibilityCriteria>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    find_tier(&state, input.tier_id).await?;

    let criteria = EligibilityCriteriaRepo::create(&state.pool, &input).await?;
    state
        .invalidator
        .apply(&Invalidation::eligibility_criteria_write())
        .await;

    tracing::info!(
        criteria_id = criteria.id,
        tier_id = criteria.tier_id,
        app_type_id = ?criteria.app_type_id,
        "Eligibility criteria created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: criteria })))
}

/// PUT /eligibility-criteria/{id}
pub async fn update_criteria(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateEligibilityCriteria>,
) -> AppResult<impl IntoResponse> {
    let existing = EligibilityCriteriaRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    input.validate_against(&existing)?;

    let criteria = EligibilityCriteriaRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    state
        .invalidator
        .apply(&Invalidation::eligibility_criteria_write())
        .await;

    tracing::info!(criteria_id = id, tier_id = criteria.tier_id, "Eligibility criteria updated");
    Ok(Json(DataResponse { data: criteria }))
}

/// DELETE /eligibility-criteria/{id}
pub async fn delete_criteria(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !EligibilityCriteriaRepo::delete(&state.pool, id).await? {
        return Err(not_found(id));
    }
    state
        .invalidator
        .apply(&Invalidation::eligibility_criteria_write())
        .await;

    tracing::info!(criteria_id = id, "Eligibility criteria deleted");
    Ok(StatusCode::NO_CONTENT)
}
