//! Customer membership model.

use serde::Serialize;
use sqlx::FromRow;
use loyalty_core::membership::Member;
use loyalty_core::types::{DbId, Timestamp};

/// A row from the `customers` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Customer {
    pub id: DbId,
    pub name: String,
    pub app_type_id: Option<DbId>,
    pub tier_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Customer {
    /// The membership view of this customer, if they hold a tier.
    pub fn membership(&self) -> Option<Member> {
        self.tier_id.map(|tier_id| Member {
            customer_id: self.id,
            tier_id,
            app_type_id: self.app_type_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn customer(tier_id: Option<DbId>) -> Customer {
        Customer {
            id: 7,
            name: "Ada".into(),
            app_type_id: Some(2),
            tier_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn tiered_customer_is_a_member() {
        let member = customer(Some(3)).membership().unwrap();
        assert_eq!(member.customer_id, 7);
        assert_eq!(member.tier_id, 3);
        assert_eq!(member.app_type_id, Some(2));
    }

    #[test]
    fn customer_without_tier_is_not_a_member() {
        assert!(customer(None).membership().is_none());
    }
}
