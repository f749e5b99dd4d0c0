//! Repository for customer tier membership.

use sqlx::PgPool;
use loyalty_core::types::DbId;

use crate::models::customer::Customer;

const COLUMNS: &str = "id, name, app_type_id, tier_id, created_at, updated_at";

/// Membership queries on the `customers` table.
pub struct CustomerRepo;

impl CustomerRepo {
    /// Find a customer by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Customer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM customers WHERE id = $1");
        sqlx::query_as::<_, Customer>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Every customer that currently holds a tier, ordered by id.
    pub async fn list_with_tier(pool: &PgPool) -> Result<Vec<Customer>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM customers
             WHERE tier_id IS NOT NULL
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, Customer>(&query).fetch_all(pool).await
    }

    /// Move a customer to another tier. Returns `true` if the row existed.
    pub async fn assign_tier(
        pool: &PgPool,
        customer_id: DbId,
        tier_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE customers SET tier_id = $2, updated_at = now() WHERE id = $1",
        )
        .bind(customer_id)
        .bind(tier_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
