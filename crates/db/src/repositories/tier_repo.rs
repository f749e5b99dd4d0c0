//! Repository for the `tiers` table.

use sqlx::PgPool;
use loyalty_core::types::DbId;

use crate::models::tier::{CreateTier, Tier, UpdateTier};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, points_required, description, is_active, created_at, updated_at";

/// Provides CRUD operations for tiers.
pub struct TierRepo;

impl TierRepo {
    /// Insert a new tier, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateTier) -> Result<Tier, sqlx::Error> {
        let query = format!(
            "INSERT INTO tiers (name, points_required, description, is_active)
             VALUES ($1, $2, COALESCE($3, '{{}}'::TEXT[]), COALESCE($4, true))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tier>(&query)
            .bind(&input.name)
            .bind(input.points_required)
            .bind(&input.description)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    /// Find a tier by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Tier>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tiers WHERE id = $1");
        sqlx::query_as::<_, Tier>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List tiers ordered from lowest to highest `points_required`.
    pub async fn list(pool: &PgPool, active_only: bool) -> Result<Vec<Tier>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tiers
             WHERE ($1 = false OR is_active)
             ORDER BY points_required ASC, id ASC"
        );
        sqlx::query_as::<_, Tier>(&query)
            .bind(active_only)
            .fetch_all(pool)
            .await
    }

    /// The active tier immediately below `tier_id` by `points_required`.
    pub async fn find_next_lower(pool: &PgPool, tier_id: DbId) -> Result<Option<Tier>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tiers
             WHERE is_active
               AND points_required < (SELECT points_required FROM tiers WHERE id = $1)
             ORDER BY points_required DESC, id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, Tier>(&query)
            .bind(tier_id)
            .fetch_optional(pool)
            .await
    }

    /// Update a tier. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTier,
    ) -> Result<Option<Tier>, sqlx::Error> {
        let query = format!(
            "UPDATE tiers SET
                name = COALESCE($2, name),
                points_required = COALESCE($3, points_required),
                description = COALESCE($4, description),
                is_active = COALESCE($5, is_active),
                updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tier>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.points_required)
            .bind(&input.description)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Delete a tier by ID. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tiers WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
