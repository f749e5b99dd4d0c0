//! Repository for the `tier_eligibility_criteria` table.

use sqlx::PgPool;
use loyalty_core::types::DbId;

use crate::models::eligibility_criteria::{
    CreateEligibilityCriteria, CriteriaFilter, EligibilityCriteriaRow, UpdateEligibilityCriteria,
};

/// Column list for tier_eligibility_criteria queries.
const COLUMNS: &str = "id, tier_id, app_type_id, net_earning_required, evaluation_period_days, \
    consecutive_periods_required, require_consecutive, grace_periods_allowed, is_active, \
    created_at, updated_at";

/// Provides CRUD operations for tier eligibility criteria.
pub struct EligibilityCriteriaRepo;

impl EligibilityCriteriaRepo {
    /// Create a criteria record, returning the created row.
    ///
    /// A second active record for the same `(tier_id, app_type_id)` fails
    /// with a `uq_` unique violation.
    pub async fn create(
        pool: &PgPool,
        input: &CreateEligibilityCriteria,
    ) -> Result<EligibilityCriteriaRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO tier_eligibility_criteria
                (tier_id, app_type_id, net_earning_required, evaluation_period_days,
                 consecutive_periods_required, require_consecutive, grace_periods_allowed,
                 is_active)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, true), COALESCE($7, 0), COALESCE($8, true))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EligibilityCriteriaRow>(&query)
            .bind(input.tier_id)
            .bind(input.app_type_id)
            .bind(input.net_earning_required)
            .bind(input.evaluation_period_days)
            .bind(input.consecutive_periods_required)
            .bind(input.require_consecutive)
            .bind(input.grace_periods_allowed)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    /// Find a criteria record by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<EligibilityCriteriaRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tier_eligibility_criteria WHERE id = $1");
        sqlx::query_as::<_, EligibilityCriteriaRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The active record for exactly `(tier_id, app_type_id)`.
    ///
    /// `app_type_id = None` matches only the tier's default record.
    pub async fn find_active(
        pool: &PgPool,
        tier_id: DbId,
        app_type_id: Option<DbId>,
    ) -> Result<Option<EligibilityCriteriaRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tier_eligibility_criteria
             WHERE tier_id = $1 AND app_type_id IS NOT DISTINCT FROM $2 AND is_active"
        );
        sqlx::query_as::<_, EligibilityCriteriaRow>(&query)
            .bind(tier_id)
            .bind(app_type_id)
            .fetch_optional(pool)
            .await
    }

    /// List criteria matching `filter`, ordered by tier then id.
    pub async fn list(
        pool: &PgPool,
        filter: &CriteriaFilter,
    ) -> Result<Vec<EligibilityCriteriaRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tier_eligibility_criteria
             WHERE ($1::BIGINT IS NULL OR tier_id = $1)
               AND ($2::BIGINT IS NULL OR app_type_id = $2)
               AND ($3 = false OR is_active)
             ORDER BY tier_id ASC, id ASC"
        );
        sqlx::query_as::<_, EligibilityCriteriaRow>(&query)
            .bind(filter.tier_id)
            .bind(filter.app_type_id)
            .bind(filter.active_only.unwrap_or(false))
            .fetch_all(pool)
            .await
    }

    /// Update a criteria record. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateEligibilityCriteria,
    ) -> Result<Option<EligibilityCriteriaRow>, sqlx::Error> {
        let query = format!(
            "UPDATE tier_eligibility_criteria SET
                net_earning_required = COALESCE($2, net_earning_required),
                evaluation_period_days = COALESCE($3, evaluation_period_days),
                consecutive_periods_required = COALESCE($4, consecutive_periods_required),
                require_consecutive = COALESCE($5, require_consecutive),
                grace_periods_allowed = COALESCE($6, grace_periods_allowed),
                is_active = COALESCE($7, is_active),
                updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EligibilityCriteriaRow>(&query)
            .bind(id)
            .bind(input.net_earning_required)
            .bind(input.evaluation_period_days)
            .bind(input.consecutive_periods_required)
            .bind(input.require_consecutive)
            .bind(input.grace_periods_allowed)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Delete a criteria record by ID. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tier_eligibility_criteria WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
