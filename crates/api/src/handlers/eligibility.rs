//! Eligibility preview: evaluate one customer against a tier's criteria.
//!
//! Not cached; the answer depends on the live ledger.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use loyalty_core::eligibility::{evaluate_for_tier, EligibilityOutcome, EligibilityResult};
use loyalty_core::error::CoreError;
use loyalty_core::types::DbId;
use loyalty_db::repositories::CustomerRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::tiers::find_tier;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for an eligibility preview.
#[derive(Debug, Deserialize)]
pub struct EligibilityParams {
    /// Overrides the customer's own app type when resolving criteria.
    pub app_type_id: Option<DbId>,
}

/// Preview payload. `result` is absent when the tier has no criteria.
#[derive(Debug, Serialize)]
pub struct EligibilityPreview {
    pub customer_id: DbId,
    pub tier_id: DbId,
    pub app_type_id: Option<DbId>,
    pub configured: bool,
    pub result: Option<EligibilityResult>,
}

/// GET /tiers/{id}/eligibility/{customer_id}
pub async fn preview_eligibility(
    State(state): State<AppState>,
    Path((tier_id, customer_id)): Path<(DbId, DbId)>,
    Query(params): Query<EligibilityParams>,
) -> AppResult<Json<DataResponse<EligibilityPreview>>> {
    find_tier(&state, tier_id).await?;

    let app_type_id = match params.app_type_id {
        Some(id) => Some(id),
        None => {
            CustomerRepo::find_by_id(&state.pool, customer_id)
                .await?
                .ok_or(AppError::Core(CoreError::NotFound {
                    entity: "Customer",
                    id: customer_id,
                }))?
                .app_type_id
        }
    };

    let cancel = state.shutdown.child_token();
    let outcome = evaluate_for_tier(
        &state.criteria_store,
        state.evaluator.as_ref(),
        customer_id,
        tier_id,
        app_type_id,
        Utc::now(),
        &cancel,
    )
    .await?;

    let result = match outcome {
        EligibilityOutcome::Evaluated(result) => Some(result),
        EligibilityOutcome::NotConfigured => None,
    };

    tracing::debug!(
        customer_id,
        tier_id,
        configured = result.is_some(),
        eligible = result.as_ref().map(|r| r.eligible),
        "Eligibility preview"
    );

    Ok(Json(DataResponse {
        data: EligibilityPreview {
            customer_id,
            tier_id,
            app_type_id,
            configured: result.is_some(),
            result,
        },
    }))
}
