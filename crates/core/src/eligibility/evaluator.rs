//! Eligibility decision and the ledger-reading evaluator.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use super::period::{aggregate_periods, partition_periods};
use super::ports::{CriteriaStore, DataAccessError, LedgerReader};
use super::{EligibilityCriteria, EligibilityResult, Period, MAX_LOOKBACK_DAYS};
use crate::types::{DbId, Timestamp};

/// Default upper bound on a single ledger read.
pub const DEFAULT_LEDGER_TIMEOUT: Duration = Duration::from_secs(30);

/// Why an evaluation produced no result.
///
/// A customer failing the criteria is not an error; it is an
/// [`EligibilityResult`] with `eligible == false`.
#[derive(Debug, thiserror::Error)]
pub enum EligibilityError {
    #[error(transparent)]
    DataAccess(#[from] DataAccessError),

    #[error("Ledger read timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Eligibility evaluation cancelled")]
    Cancelled,

    /// The criteria's lookback window is longer than
    /// [`MAX_LOOKBACK_DAYS`] or leaves the representable time range.
    #[error("Criteria {criteria_id} has an unsupported lookback window")]
    LookbackOutOfRange { criteria_id: DbId },
}

/// Result of evaluating a customer against whatever criteria apply to
/// their tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EligibilityOutcome {
    Evaluated(EligibilityResult),
    /// No active criteria exist for the tier (nor a default for it).
    NotConfigured,
}

// ---------------------------------------------------------------------------
// Pure decision
// ---------------------------------------------------------------------------

/// Longest count of qualifying periods in any contiguous stretch that
/// contains at most `grace` non-qualifying periods.
///
/// Misses inside the stretch do not count toward its length. With
/// `grace == 0` this is the plain longest consecutive run.
pub fn max_run_with_grace(flags: &[bool], grace: usize) -> usize {
    let mut best = 0;
    let mut left = 0;
    let mut hits = 0;
    let mut misses = 0;

    for &qualifies in flags {
        if qualifies {
            hits += 1;
        } else {
            misses += 1;
        }

        while misses > grace {
            if flags[left] {
                hits -= 1;
            } else {
                misses -= 1;
            }
            left += 1;
        }

        best = best.max(hits);
    }

    best
}

/// Scan aggregated periods (oldest first) and decide eligibility.
pub fn summarize_periods(periods: Vec<Period>, criteria: &EligibilityCriteria) -> EligibilityResult {
    let mut qualifying = 0usize;
    let mut run = 0usize;
    let mut max_consecutive = 0usize;

    for period in &periods {
        if period.meets_requirement {
            qualifying += 1;
            run += 1;
            max_consecutive = max_consecutive.max(run);
        } else {
            run = 0;
        }
    }

    let flags: Vec<bool> = periods.iter().map(|p| p.meets_requirement).collect();
    let with_grace = max_run_with_grace(&flags, criteria.grace_periods_allowed as usize);

    let required = criteria.consecutive_periods_required as usize;
    let eligible = if criteria.require_consecutive {
        with_grace >= required
    } else {
        qualifying >= required
    };

    EligibilityResult {
        eligible,
        periods_checked: periods.len(),
        qualifying_periods: qualifying,
        max_consecutive_qualifying: max_consecutive,
        max_run_with_grace: with_grace,
        required_periods: criteria.consecutive_periods_required,
        period_breakdown: periods,
        criteria: criteria.snapshot(),
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Evaluates customers against criteria by reading their ledger.
pub struct EligibilityEvaluator<L> {
    ledger: L,
    io_timeout: Duration,
}

impl<L: LedgerReader> EligibilityEvaluator<L> {
    pub fn new(ledger: L) -> Self {
        Self {
            ledger,
            io_timeout: DEFAULT_LEDGER_TIMEOUT,
        }
    }

    /// Override the ledger read timeout.
    pub fn with_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    /// Evaluate `customer_id` against `criteria` as of the current instant.
    pub async fn evaluate(
        &self,
        criteria: &EligibilityCriteria,
        customer_id: DbId,
        cancel: &CancellationToken,
    ) -> Result<EligibilityResult, EligibilityError> {
        self.evaluate_at(criteria, customer_id, Utc::now(), cancel)
            .await
    }

    /// Evaluate `customer_id` against `criteria` with periods ending at `now`.
    pub async fn evaluate_at(
        &self,
        criteria: &EligibilityCriteria,
        customer_id: DbId,
        now: Timestamp,
        cancel: &CancellationToken,
    ) -> Result<EligibilityResult, EligibilityError> {
        let out_of_range = || EligibilityError::LookbackOutOfRange {
            criteria_id: criteria.id,
        };
        let since = criteria.lookback_start(now).ok_or_else(out_of_range)?;
        let windows = partition_periods(
            now,
            criteria.evaluation_period_days,
            criteria.periods_to_check(),
        )
        .ok_or_else(out_of_range)?;

        let read = self.ledger.list_completed_transactions(customer_id, since);

        let transactions = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(EligibilityError::Cancelled),
            res = tokio::time::timeout(self.io_timeout, read) => match res {
                Ok(read_result) => read_result?,
                Err(_) => return Err(EligibilityError::TimedOut(self.io_timeout)),
            },
        };

        let periods = aggregate_periods(&windows, &transactions, criteria.net_earning_required);
        let result = summarize_periods(periods, criteria);

        tracing::debug!(
            customer_id,
            tier_id = criteria.tier_id,
            transactions = transactions.len(),
            qualifying = result.qualifying_periods,
            eligible = result.eligible,
            "Eligibility evaluated"
        );

        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Criteria resolution
// ---------------------------------------------------------------------------

/// Find the criteria that apply to a tier for an app type.
///
/// Prefers an active app-specific record, then the tier's default record.
/// `Ok(None)` means nothing is configured, which callers treat as
/// "not evaluated", not as an error.
pub async fn resolve_criteria<S: CriteriaStore + ?Sized>(
    store: &S,
    tier_id: DbId,
    app_type_id: Option<DbId>,
) -> Result<Option<EligibilityCriteria>, DataAccessError> {
    if let Some(app_type_id) = app_type_id {
        let specific = store.find_active_criteria(tier_id, Some(app_type_id)).await?;
        if specific.is_some() {
            return Ok(specific);
        }
    }
    store.find_active_criteria(tier_id, None).await
}

/// Resolve the criteria for a tier and evaluate the customer against them.
pub async fn evaluate_for_tier<S, L>(
    store: &S,
    evaluator: &EligibilityEvaluator<L>,
    customer_id: DbId,
    tier_id: DbId,
    app_type_id: Option<DbId>,
    now: Timestamp,
    cancel: &CancellationToken,
) -> Result<EligibilityOutcome, EligibilityError>
where
    S: CriteriaStore + ?Sized,
    L: LedgerReader,
{
    let Some(criteria) = resolve_criteria(store, tier_id, app_type_id).await? else {
        return Ok(EligibilityOutcome::NotConfigured);
    };

    let result = evaluator
        .evaluate_at(&criteria, customer_id, now, cancel)
        .await?;
    Ok(EligibilityOutcome::Evaluated(result))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
