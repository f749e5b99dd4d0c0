//! Read-only repository for the `point_transactions` ledger.

use sqlx::PgExecutor;
use loyalty_core::eligibility::STATUS_COMPLETED;
use loyalty_core::types::{DbId, Timestamp};

use crate::models::transaction::PointTransaction;

const COLUMNS: &str =
    "id, customer_id, transaction_type, points, status, transaction_date, created_at";

/// Ledger queries. Generic over the executor so callers may pass a pool,
/// a connection, or `&mut *tx` to read inside their own transaction.
pub struct TransactionRepo;

impl TransactionRepo {
    /// Completed transactions for a customer dated at or after `since`,
    /// oldest first.
    pub async fn list_completed_since<'e, E>(
        executor: E,
        customer_id: DbId,
        since: Timestamp,
    ) -> Result<Vec<PointTransaction>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM point_transactions
             WHERE customer_id = $1 AND status = $2 AND transaction_date >= $3
             ORDER BY transaction_date ASC, id ASC"
        );
        sqlx::query_as::<_, PointTransaction>(&query)
            .bind(customer_id)
            .bind(STATUS_COMPLETED)
            .bind(since)
            .fetch_all(executor)
            .await
    }
}
