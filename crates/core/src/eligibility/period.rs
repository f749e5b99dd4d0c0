//! Period partitioning and net-earning aggregation.
//!
//! Both functions are pure and deterministic given `now`; the evaluator
//! feeds them the transactions it read for the whole lookback window.

use chrono::TimeDelta;

use super::{LedgerTransaction, Period, TransactionType};
use crate::types::Timestamp;

/// A half-open time window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl PeriodWindow {
    /// Whether `at` falls inside the window. `end` is exclusive.
    pub fn contains(&self, at: Timestamp) -> bool {
        self.start <= at && at < self.end
    }
}

/// Divide the `count * period_days` days before `now` into `count`
/// contiguous windows, oldest first.
///
/// Window `i` ends at `now - (count - 1 - i) * period_days` and starts
/// `period_days` before that, so the newest window always ends at `now`.
/// Returns `None` if any boundary falls outside the timestamp range.
pub fn partition_periods(
    now: Timestamp,
    period_days: u32,
    count: u32,
) -> Option<Vec<PeriodWindow>> {
    let length = TimeDelta::try_days(i64::from(period_days))?;

    (0..count)
        .map(|i| {
            let periods_back = i64::from(count - 1 - i);
            let offset = periods_back
                .checked_mul(i64::from(period_days))
                .and_then(TimeDelta::try_days)?;
            let end = now.checked_sub_signed(offset)?;
            Some(PeriodWindow {
                start: end.checked_sub_signed(length)?,
                end,
            })
        })
        .collect()
}

/// Signed contribution of one transaction to net earning.
///
/// Earns and positive adjustments add their magnitude, redemptions subtract
/// theirs, everything else (including non-positive adjustments) is ignored.
pub fn signed_points(tx: &LedgerTransaction) -> i64 {
    match tx.transaction_type {
        TransactionType::Earn => tx.points.saturating_abs(),
        TransactionType::Adjust if tx.points > 0 => tx.points,
        TransactionType::Redeem => -tx.points.saturating_abs(),
        _ => 0,
    }
}

/// Net points earned by transactions dated inside `window`.
pub fn net_earned_in(window: &PeriodWindow, transactions: &[LedgerTransaction]) -> i64 {
    transactions
        .iter()
        .filter(|tx| window.contains(tx.transaction_date))
        .fold(0i64, |total, tx| total.saturating_add(signed_points(tx)))
}

/// Aggregate every window and flag those meeting `net_earning_required`.
pub fn aggregate_periods(
    windows: &[PeriodWindow],
    transactions: &[LedgerTransaction],
    net_earning_required: i64,
) -> Vec<Period> {
    windows
        .iter()
        .map(|window| {
            let net_earned = net_earned_in(window, transactions);
            Period {
                start: window.start,
                end: window.end,
                net_earned,
                meets_requirement: net_earned >= net_earning_required,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
