//! Customer tier membership port used by the downgrade job.

use std::sync::Arc;

use async_trait::async_trait;

use crate::eligibility::DataAccessError;
use crate::types::DbId;

/// A customer currently holding a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member {
    pub customer_id: DbId,
    pub tier_id: DbId,
    pub app_type_id: Option<DbId>,
}

/// Reads and reassigns customer tiers.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Every customer that currently has a tier.
    async fn list_members(&self) -> Result<Vec<Member>, DataAccessError>;

    /// The active tier with the greatest `points_required` strictly below
    /// that of `tier_id`, or `None` if `tier_id` is the floor.
    async fn next_lower_tier(&self, tier_id: DbId) -> Result<Option<DbId>, DataAccessError>;

    /// Move a customer to `tier_id`. Returns `false` if the customer is gone.
    async fn assign_tier(&self, customer_id: DbId, tier_id: DbId) -> Result<bool, DataAccessError>;
}

#[async_trait]
impl<T: MembershipStore + ?Sized> MembershipStore for Arc<T> {
    async fn list_members(&self) -> Result<Vec<Member>, DataAccessError> {
        (**self).list_members().await
    }

    async fn next_lower_tier(&self, tier_id: DbId) -> Result<Option<DbId>, DataAccessError> {
        (**self).next_lower_tier(tier_id).await
    }

    async fn assign_tier(&self, customer_id: DbId, tier_id: DbId) -> Result<bool, DataAccessError> {
        (**self).assign_tier(customer_id, tier_id).await
    }
}
