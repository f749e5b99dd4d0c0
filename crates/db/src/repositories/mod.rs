//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async queries that
//! accept `&PgPool` as the first argument. Ledger reads accept any
//! `PgExecutor` so they can run inside a caller's transaction.

pub mod customer_repo;
pub mod eligibility_criteria_repo;
pub mod tier_repo;
pub mod transaction_repo;

pub use customer_repo::CustomerRepo;
pub use eligibility_criteria_repo::EligibilityCriteriaRepo;
pub use tier_repo::TierRepo;
pub use transaction_repo::TransactionRepo;
