//! Monthly tier downgrade pass.
//!
//! Every customer holding a tier is evaluated against the eligibility
//! criteria that apply to that tier. Customers who no longer qualify move
//! down exactly one tier; the lowest tier is a floor. Tiers without
//! criteria are skipped.
//!
//! One customer's failure never aborts the pass: data-access errors and
//! ledger timeouts are logged and counted, and the next customer is
//! processed. Only a failure to list members, or cancellation, ends the run
//! early.

use chrono::Utc;
use loyalty_cache::CacheInvalidator;
use loyalty_core::cache_keys::Invalidation;
use loyalty_core::eligibility::{
    evaluate_for_tier, CriteriaStore, DataAccessError, EligibilityError, EligibilityEvaluator,
    EligibilityOutcome, LedgerReader,
};
use loyalty_core::membership::{Member, MembershipStore};
use loyalty_core::types::Timestamp;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Counts from one downgrade pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DowngradeSummary {
    /// Customers holding a tier when the pass started.
    pub members: usize,
    /// Customers evaluated against criteria.
    pub evaluated: usize,
    /// Evaluated customers who still qualify.
    pub retained: usize,
    /// Customers moved to a lower tier.
    pub downgraded: usize,
    /// Non-qualifying customers already on the lowest tier.
    pub at_floor: usize,
    /// Customers whose tier has no criteria configured.
    pub not_configured: usize,
    /// Customers skipped because of a read or write failure.
    pub failed: usize,
}

/// Why a pass ended early.
#[derive(Debug, thiserror::Error)]
pub enum DowngradeError {
    #[error("Failed to list tier members: {0}")]
    ListMembers(#[source] DataAccessError),

    #[error("Tier downgrade cancelled after {processed} customers")]
    Cancelled { processed: usize },
}

/// What happened to a single customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberOutcome {
    Retained,
    Downgraded,
    AtFloor,
    NotConfigured,
    Failed,
}

/// The downgrade pass over its collaborators.
pub struct TierDowngradeJob<M, C, L> {
    members: M,
    criteria: C,
    evaluator: EligibilityEvaluator<L>,
    invalidator: CacheInvalidator,
}

impl<M, C, L> TierDowngradeJob<M, C, L>
where
    M: MembershipStore,
    C: CriteriaStore,
    L: LedgerReader,
{
    pub fn new(
        members: M,
        criteria: C,
        evaluator: EligibilityEvaluator<L>,
        invalidator: CacheInvalidator,
    ) -> Self {
        Self {
            members,
            criteria,
            evaluator,
            invalidator,
        }
    }

    /// Run a pass as of the current instant and log its summary.
    pub async fn run_scheduled(&self, cancel: CancellationToken) -> Result<(), DowngradeError> {
        let summary = self.run(Utc::now(), &cancel).await?;
        tracing::info!(
            members = summary.members,
            evaluated = summary.evaluated,
            retained = summary.retained,
            downgraded = summary.downgraded,
            at_floor = summary.at_floor,
            not_configured = summary.not_configured,
            failed = summary.failed,
            "Tier downgrade pass finished"
        );
        Ok(())
    }

    /// Evaluate every member with periods ending at `now`.
    pub async fn run(
        &self,
        now: Timestamp,
        cancel: &CancellationToken,
    ) -> Result<DowngradeSummary, DowngradeError> {
        let members = self
            .members
            .list_members()
            .await
            .map_err(DowngradeError::ListMembers)?;

        let mut summary = DowngradeSummary {
            members: members.len(),
            ..Default::default()
        };
        tracing::info!(members = summary.members, "Tier downgrade pass started");

        for (processed, member) in members.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(DowngradeError::Cancelled { processed });
            }

            match self.process(member, now, cancel).await {
                Ok(outcome) => summary.record(outcome),
                Err(EligibilityError::Cancelled) => {
                    return Err(DowngradeError::Cancelled { processed });
                }
                Err(e) => {
                    tracing::warn!(
                        customer_id = member.customer_id,
                        tier_id = member.tier_id,
                        error = %e,
                        "Skipping customer in tier downgrade"
                    );
                    summary.record(MemberOutcome::Failed);
                }
            }
        }

        Ok(summary)
    }

    async fn process(
        &self,
        member: &Member,
        now: Timestamp,
        cancel: &CancellationToken,
    ) -> Result<MemberOutcome, EligibilityError> {
        let outcome = evaluate_for_tier(
            &self.criteria,
            &self.evaluator,
            member.customer_id,
            member.tier_id,
            member.app_type_id,
            now,
            cancel,
        )
        .await?;

        let result = match outcome {
            EligibilityOutcome::NotConfigured => return Ok(MemberOutcome::NotConfigured),
            EligibilityOutcome::Evaluated(result) => result,
        };
        if result.eligible {
            return Ok(MemberOutcome::Retained);
        }

        let Some(lower) = self.members.next_lower_tier(member.tier_id).await? else {
            tracing::debug!(
                customer_id = member.customer_id,
                tier_id = member.tier_id,
                "Customer not eligible but already on the lowest tier"
            );
            return Ok(MemberOutcome::AtFloor);
        };

        if !self.members.assign_tier(member.customer_id, lower).await? {
            // Customer deleted between listing and assignment.
            return Ok(MemberOutcome::Failed);
        }

        self.invalidator
            .apply(&Invalidation::customer_write(member.customer_id))
            .await;

        tracing::info!(
            customer_id = member.customer_id,
            from_tier = member.tier_id,
            to_tier = lower,
            qualifying_periods = result.qualifying_periods,
            required_periods = result.required_periods,
            "Customer downgraded"
        );
        Ok(MemberOutcome::Downgraded)
    }
}

impl DowngradeSummary {
    fn record(&mut self, outcome: MemberOutcome) {
        match outcome {
            MemberOutcome::Retained => {
                self.evaluated += 1;
                self.retained += 1;
            }
            MemberOutcome::Downgraded => {
                self.evaluated += 1;
                self.downgraded += 1;
            }
            MemberOutcome::AtFloor => {
                self.evaluated += 1;
                self.at_floor += 1;
            }
            MemberOutcome::NotConfigured => self.not_configured += 1,
            MemberOutcome::Failed => self.failed += 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
