//! Point transaction ledger model. Read-only from this service.

use serde::Serialize;
use sqlx::FromRow;
use loyalty_core::eligibility::{LedgerTransaction, TransactionType};
use loyalty_core::types::{DbId, Timestamp};

/// A row from the `point_transactions` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PointTransaction {
    pub id: DbId,
    pub customer_id: DbId,
    pub transaction_type: String,
    pub points: i64,
    pub status: String,
    pub transaction_date: Timestamp,
    pub created_at: Timestamp,
}

impl From<PointTransaction> for LedgerTransaction {
    fn from(row: PointTransaction) -> Self {
        LedgerTransaction {
            id: row.id,
            customer_id: row.customer_id,
            transaction_date: row.transaction_date,
            transaction_type: TransactionType::from_str_value(&row.transaction_type),
            points: row.points,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn unknown_type_is_preserved_on_conversion() {
        let row = PointTransaction {
            id: 1,
            customer_id: 9,
            transaction_type: "expire".into(),
            points: -40,
            status: "completed".into(),
            transaction_date: Utc::now(),
            created_at: Utc::now(),
        };

        let tx = LedgerTransaction::from(row);
        assert_eq!(tx.transaction_type, TransactionType::Other("expire".into()));
        assert_eq!(tx.points, -40);
    }
}
