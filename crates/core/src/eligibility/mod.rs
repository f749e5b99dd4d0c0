//! Tier eligibility criteria and evaluation.
//!
//! A tier's criteria require a customer to earn at least
//! `net_earning_required` points in each of a number of fixed-length
//! evaluation periods ending now. Evaluation is split into pure pieces
//! ([`period`] partitioning and aggregation, [`evaluator::summarize_periods`])
//! and an I/O shell ([`evaluator::EligibilityEvaluator`]) that reads the
//! ledger through the [`ports::LedgerReader`] port.

pub mod evaluator;
pub mod period;
pub mod ports;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

pub use evaluator::{
    evaluate_for_tier, max_run_with_grace, resolve_criteria, summarize_periods,
    EligibilityError, EligibilityEvaluator, EligibilityOutcome,
};
pub use period::{aggregate_periods, net_earned_in, partition_periods, PeriodWindow};
pub use ports::{CriteriaStore, DataAccessError, LedgerReader};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Ledger status of a transaction that counts toward net earning.
pub const STATUS_COMPLETED: &str = "completed";

/// Transaction type strings as stored in the ledger.
pub const TYPE_EARN: &str = "earn";
pub const TYPE_REDEEM: &str = "redeem";
pub const TYPE_ADJUST: &str = "adjust";

/// Upper bound on `evaluation_period_days * (consecutive + grace)` accepted
/// from administrators. Roughly ten years.
pub const MAX_LOOKBACK_DAYS: i64 = 3660;

// ---------------------------------------------------------------------------
// Ledger types
// ---------------------------------------------------------------------------

/// Kind of a ledger transaction, as far as net earning is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Earn,
    Redeem,
    Adjust,
    /// Any other ledger type (expiry, transfer, ...). Ignored by net earning.
    Other(String),
}

impl TransactionType {
    /// Convert from a database string value. Unknown types are preserved
    /// as [`TransactionType::Other`] rather than rejected.
    pub fn from_str_value(s: &str) -> Self {
        match s {
            TYPE_EARN => Self::Earn,
            TYPE_REDEEM => Self::Redeem,
            TYPE_ADJUST => Self::Adjust,
            other => Self::Other(other.to_string()),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Earn => TYPE_EARN,
            Self::Redeem => TYPE_REDEEM,
            Self::Adjust => TYPE_ADJUST,
            Self::Other(s) => s,
        }
    }
}

/// A completed ledger transaction as seen by the evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTransaction {
    pub id: DbId,
    pub customer_id: DbId,
    pub transaction_date: Timestamp,
    pub transaction_type: TransactionType,
    pub points: i64,
}

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

/// Eligibility criteria for one tier, optionally narrowed to an app type.
///
/// Immutable for the duration of an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibilityCriteria {
    pub id: DbId,
    pub tier_id: DbId,
    /// `None` marks the tier's default criteria.
    pub app_type_id: Option<DbId>,
    pub net_earning_required: i64,
    pub evaluation_period_days: u32,
    pub consecutive_periods_required: u32,
    pub require_consecutive: bool,
    pub grace_periods_allowed: u32,
    pub is_active: bool,
}

impl EligibilityCriteria {
    /// Number of periods examined: the required run plus the grace allowance.
    pub fn periods_to_check(&self) -> u32 {
        self.consecutive_periods_required
            .max(1)
            .saturating_add(self.grace_periods_allowed)
    }

    /// Total lookback window in days. `None` if the product overflows.
    pub fn lookback_days(&self) -> Option<i64> {
        i64::from(self.evaluation_period_days).checked_mul(i64::from(self.periods_to_check()))
    }

    /// Start of the lookback window that ends at `now`.
    ///
    /// `None` when the lookback exceeds [`MAX_LOOKBACK_DAYS`] or the start
    /// is not a representable timestamp.
    pub fn lookback_start(&self, now: Timestamp) -> Option<Timestamp> {
        let days = self
            .lookback_days()
            .filter(|days| *days <= MAX_LOOKBACK_DAYS)?;
        now.checked_sub_signed(TimeDelta::try_days(days)?)
    }

    /// The subset of fields that drive the decision, for result auditing.
    pub fn snapshot(&self) -> CriteriaSnapshot {
        CriteriaSnapshot {
            net_earning_required: self.net_earning_required,
            evaluation_period_days: self.evaluation_period_days,
            consecutive_periods_required: self.consecutive_periods_required,
            require_consecutive: self.require_consecutive,
            grace_periods_allowed: self.grace_periods_allowed,
        }
    }
}

/// Copy of the criteria values an [`EligibilityResult`] was computed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CriteriaSnapshot {
    pub net_earning_required: i64,
    pub evaluation_period_days: u32,
    pub consecutive_periods_required: u32,
    pub require_consecutive: bool,
    pub grace_periods_allowed: u32,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// One evaluated period, `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Period {
    pub start: Timestamp,
    pub end: Timestamp,
    pub net_earned: i64,
    pub meets_requirement: bool,
}

/// Outcome of evaluating one customer against one criteria record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibilityResult {
    pub eligible: bool,
    pub periods_checked: usize,
    pub qualifying_periods: usize,
    /// Longest run of qualifying periods with no miss in between.
    pub max_consecutive_qualifying: usize,
    /// Longest run of qualifying periods allowing up to
    /// `grace_periods_allowed` misses inside the run.
    pub max_run_with_grace: usize,
    pub required_periods: u32,
    pub period_breakdown: Vec<Period>,
    pub criteria: CriteriaSnapshot,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate raw criteria values received from an administrator.
pub fn validate_criteria_values(
    net_earning_required: i64,
    evaluation_period_days: i32,
    consecutive_periods_required: i32,
    grace_periods_allowed: i32,
) -> Result<(), CoreError> {
    if net_earning_required < 0 {
        return Err(CoreError::Validation(format!(
            "net_earning_required must be >= 0, got {net_earning_required}"
        )));
    }
    if evaluation_period_days < 1 {
        return Err(CoreError::Validation(format!(
            "evaluation_period_days must be >= 1, got {evaluation_period_days}"
        )));
    }
    if consecutive_periods_required < 1 {
        return Err(CoreError::Validation(format!(
            "consecutive_periods_required must be >= 1, got {consecutive_periods_required}"
        )));
    }
    if grace_periods_allowed < 0 {
        return Err(CoreError::Validation(format!(
            "grace_periods_allowed must be >= 0, got {grace_periods_allowed}"
        )));
    }

    let lookback = i64::from(evaluation_period_days)
        * (i64::from(consecutive_periods_required) + i64::from(grace_periods_allowed));
    if lookback > MAX_LOOKBACK_DAYS {
        return Err(CoreError::Validation(format!(
            "Total lookback of {lookback} days exceeds maximum of {MAX_LOOKBACK_DAYS}"
        )));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria(days: u32, consecutive: u32, grace: u32) -> EligibilityCriteria {
        EligibilityCriteria {
            id: 1,
            tier_id: 1,
            app_type_id: None,
            net_earning_required: 100,
            evaluation_period_days: days,
            consecutive_periods_required: consecutive,
            require_consecutive: true,
            grace_periods_allowed: grace,
            is_active: true,
        }
    }

    // -- TransactionType ------------------------------------------------------

    #[test]
    fn transaction_type_known_values() {
        assert_eq!(TransactionType::from_str_value("earn"), TransactionType::Earn);
        assert_eq!(TransactionType::from_str_value("redeem"), TransactionType::Redeem);
        assert_eq!(TransactionType::from_str_value("adjust"), TransactionType::Adjust);
    }

    #[test]
    fn transaction_type_unknown_is_preserved() {
        let t = TransactionType::from_str_value("expire");
        assert_eq!(t, TransactionType::Other("expire".to_string()));
        assert_eq!(t.as_str(), "expire");
    }

    // -- Criteria -------------------------------------------------------------

    #[test]
    fn lookback_covers_required_and_grace_periods() {
        assert_eq!(criteria(30, 3, 0).lookback_days(), Some(90));
        assert_eq!(criteria(30, 3, 1).lookback_days(), Some(120));
    }

    #[test]
    fn lookback_of_largest_counts_does_not_wrap() {
        assert_eq!(criteria(u32::MAX, u32::MAX, 0).lookback_days(), None);
    }

    #[test]
    fn lookback_start_is_bounded() {
        let now = chrono::Utc::now();
        assert_eq!(
            criteria(30, 3, 0).lookback_start(now),
            Some(now - TimeDelta::days(90))
        );
        assert_eq!(criteria(366, 10, 0).lookback_start(now), Some(now - TimeDelta::days(3660)));
        assert_eq!(criteria(100_000, 1_000, 0).lookback_start(now), None);
        assert_eq!(criteria(3661, 1, 0).lookback_start(now), None);
    }

    #[test]
    fn periods_to_check_without_grace_equals_required() {
        assert_eq!(criteria(7, 4, 0).periods_to_check(), 4);
    }

    // -- validate_criteria_values ---------------------------------------------

    #[test]
    fn accepts_minimal_values() {
        assert!(validate_criteria_values(0, 1, 1, 0).is_ok());
    }

    #[test]
    fn rejects_negative_net_earning() {
        assert!(validate_criteria_values(-1, 30, 3, 0).is_err());
    }

    #[test]
    fn rejects_zero_period_days() {
        assert!(validate_criteria_values(100, 0, 3, 0).is_err());
    }

    #[test]
    fn rejects_zero_consecutive_periods() {
        assert!(validate_criteria_values(100, 30, 0, 0).is_err());
    }

    #[test]
    fn rejects_negative_grace() {
        assert!(validate_criteria_values(100, 30, 3, -1).is_err());
    }

    #[test]
    fn rejects_excessive_lookback() {
        let err = validate_criteria_values(100, 365, 10, 1).unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"));
    }
}
