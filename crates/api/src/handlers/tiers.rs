//! Handlers for loyalty tiers.
//!
//! Reads go through the response cache; every write invalidates the
//! tier's own key and all tier listings before responding.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use loyalty_core::cache_keys::{CachePattern, CacheQuery, CacheResource, Invalidation};
use loyalty_core::error::CoreError;
use loyalty_core::tier::{validate_points_required, validate_tier_name};
use loyalty_core::types::DbId;
use loyalty_db::models::tier::{CreateTier, Tier, UpdateTier};
use loyalty_db::repositories::TierRepo;

use crate::error::{AppError, AppResult};
use crate::response::{cached_response, DataResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for listing tiers.
#[derive(Debug, Default, Deserialize)]
pub struct TierListParams {
    pub active_only: Option<bool>,
}

impl TierListParams {
    fn cache_query(&self) -> CacheQuery {
        self.active_only
            .map(|v| ("active_only", v.to_string()))
            .into_iter()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /tiers
pub async fn list_tiers(
    State(state): State<AppState>,
    Query(params): Query<TierListParams>,
) -> AppResult<Response> {
    let resource = CacheResource::Tiers(params.cache_query());
    let active_only = params.active_only.unwrap_or(false);

    let cached = state
        .cache
        .cached(&resource, || async {
            TierRepo::list(&state.pool, active_only)
                .await
                .map_err(AppError::from)
        })
        .await?;

    Ok(cached_response(cached))
}

/// GET /tiers/{id}
pub async fn get_tier(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<Response> {
    let cached = state
        .cache
        .cached(&CacheResource::Tier(id), || async {
            find_tier(&state, id).await
        })
        .await?;

    Ok(cached_response(cached))
}

pub(crate) async fn find_tier(state: &AppState, id: DbId) -> AppResult<Tier> {
    TierRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Tier", id }))
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// POST /tiers
pub async fn create_tier(
    State(state): State<AppState>,
    Json(input): Json<CreateTier>,
) -> AppResult<impl IntoResponse> {
    validate_tier_name(&input.name)?;
    validate_points_required(input.points_required)?;

    let tier = TierRepo::create(&state.pool, &input).await?;
    state.invalidator.apply(&Invalidation::tier_created()).await;

    tracing::info!(tier_id = tier.id, name = %tier.name, "Tier created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: tier })))
}

/// PUT /tiers/{id}
pub async fn update_tier(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTier>,
) -> AppResult<impl IntoResponse> {
    if let Some(name) = &input.name {
        validate_tier_name(name)?;
    }
    if let Some(points) = input.points_required {
        validate_points_required(points)?;
    }

    let tier = TierRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Tier", id }))?;
    state.invalidator.apply(&Invalidation::tier_write(id)).await;

    tracing::info!(tier_id = id, "Tier updated");
    Ok(Json(DataResponse { data: tier }))
}

/// DELETE /tiers/{id}
///
/// Criteria belonging to the tier are removed with it, so criteria
/// listings are invalidated too.
pub async fn delete_tier(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !TierRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "Tier", id }));
    }

    let invalidation =
        Invalidation::tier_write(id).pattern(CachePattern::AllEligibilityCriteria);
    state.invalidator.apply(&invalidation).await;

    tracing::info!(tier_id = id, "Tier deleted");
    Ok(StatusCode::NO_CONTENT)
}
