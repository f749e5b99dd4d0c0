//! Persistence ports used by eligibility evaluation.
//!
//! The `db` crate implements these against Postgres; tests use in-memory
//! fakes. Domain functions never see a connection pool.

use std::sync::Arc;

use async_trait::async_trait;

use super::{EligibilityCriteria, LedgerTransaction};
use crate::types::{DbId, Timestamp};

/// A ledger or criteria-store read failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Data access failed: {0}")]
pub struct DataAccessError(pub String);

impl DataAccessError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Read-only access to a customer's point transactions.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Completed transactions for `customer_id` dated at or after `since`,
    /// ordered by `transaction_date` ascending.
    async fn list_completed_transactions(
        &self,
        customer_id: DbId,
        since: Timestamp,
    ) -> Result<Vec<LedgerTransaction>, DataAccessError>;
}

/// Lookup of active eligibility criteria.
#[async_trait]
pub trait CriteriaStore: Send + Sync {
    /// The active criteria for exactly `(tier_id, app_type_id)`, where
    /// `None` selects the tier's default record. No fallback is applied here.
    async fn find_active_criteria(
        &self,
        tier_id: DbId,
        app_type_id: Option<DbId>,
    ) -> Result<Option<EligibilityCriteria>, DataAccessError>;
}

#[async_trait]
impl<T: LedgerReader + ?Sized> LedgerReader for Arc<T> {
    async fn list_completed_transactions(
        &self,
        customer_id: DbId,
        since: Timestamp,
    ) -> Result<Vec<LedgerTransaction>, DataAccessError> {
        (**self).list_completed_transactions(customer_id, since).await
    }
}

#[async_trait]
impl<T: CriteriaStore + ?Sized> CriteriaStore for Arc<T> {
    async fn find_active_criteria(
        &self,
        tier_id: DbId,
        app_type_id: Option<DbId>,
    ) -> Result<Option<EligibilityCriteria>, DataAccessError> {
        (**self).find_active_criteria(tier_id, app_type_id).await
    }
}
