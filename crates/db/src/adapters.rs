//! Postgres implementations of the core's persistence ports.

use async_trait::async_trait;
use loyalty_core::eligibility::{
    CriteriaStore, DataAccessError, EligibilityCriteria, LedgerReader, LedgerTransaction,
};
use loyalty_core::membership::{Member, MembershipStore};
use loyalty_core::types::{DbId, Timestamp};

use crate::repositories::{CustomerRepo, EligibilityCriteriaRepo, TierRepo, TransactionRepo};
use crate::DbPool;

fn data_access(err: sqlx::Error) -> DataAccessError {
    DataAccessError::new(err.to_string())
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Reads the `point_transactions` ledger from a pool.
#[derive(Clone)]
pub struct PgLedgerReader {
    pool: DbPool,
}

impl PgLedgerReader {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerReader for PgLedgerReader {
    async fn list_completed_transactions(
        &self,
        customer_id: DbId,
        since: Timestamp,
    ) -> Result<Vec<LedgerTransaction>, DataAccessError> {
        let rows = TransactionRepo::list_completed_since(&self.pool, customer_id, since)
            .await
            .map_err(data_access)?;
        Ok(rows.into_iter().map(LedgerTransaction::from).collect())
    }
}

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

/// Looks up active eligibility criteria.
#[derive(Clone)]
pub struct PgCriteriaStore {
    pool: DbPool,
}

impl PgCriteriaStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CriteriaStore for PgCriteriaStore {
    async fn find_active_criteria(
        &self,
        tier_id: DbId,
        app_type_id: Option<DbId>,
    ) -> Result<Option<EligibilityCriteria>, DataAccessError> {
        let row = EligibilityCriteriaRepo::find_active(&self.pool, tier_id, app_type_id)
            .await
            .map_err(data_access)?;

        row.map(EligibilityCriteria::try_from)
            .transpose()
            .map_err(|e| DataAccessError::new(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Membership
// ---------------------------------------------------------------------------

/// Reads and reassigns customer tiers.
#[derive(Clone)]
pub struct PgMembershipStore {
    pool: DbPool,
}

impl PgMembershipStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipStore for PgMembershipStore {
    async fn list_members(&self) -> Result<Vec<Member>, DataAccessError> {
        let customers = CustomerRepo::list_with_tier(&self.pool)
            .await
            .map_err(data_access)?;
        Ok(customers.iter().filter_map(|c| c.membership()).collect())
    }

    async fn next_lower_tier(&self, tier_id: DbId) -> Result<Option<DbId>, DataAccessError> {
        let lower = TierRepo::find_next_lower(&self.pool, tier_id)
            .await
            .map_err(data_access)?;
        Ok(lower.map(|t| t.id))
    }

    async fn assign_tier(&self, customer_id: DbId, tier_id: DbId) -> Result<bool, DataAccessError> {
        CustomerRepo::assign_tier(&self.pool, customer_id, tier_id)
            .await
            .map_err(data_access)
    }
}
