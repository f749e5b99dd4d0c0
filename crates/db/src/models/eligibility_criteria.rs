//! Tier eligibility criteria model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use loyalty_core::eligibility::{
    validate_criteria_values, EligibilityCriteria, MAX_LOOKBACK_DAYS,
};
use loyalty_core::error::CoreError;
use loyalty_core::types::{DbId, Timestamp};

/// A row from the `tier_eligibility_criteria` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EligibilityCriteriaRow {
    pub id: DbId,
    pub tier_id: DbId,
    pub app_type_id: Option<DbId>,
    pub net_earning_required: i64,
    pub evaluation_period_days: i32,
    pub consecutive_periods_required: i32,
    pub require_consecutive: bool,
    pub grace_periods_allowed: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<EligibilityCriteriaRow> for EligibilityCriteria {
    type Error = CoreError;

    /// Rejects rows the table's CHECK constraints should have kept out.
    fn try_from(row: EligibilityCriteriaRow) -> Result<Self, Self::Error> {
        let non_negative = |field: &str, v: i32| {
            u32::try_from(v).map_err(|_| {
                CoreError::Internal(format!(
                    "Criteria {} has negative {field}: {v}",
                    row.id
                ))
            })
        };

        let criteria = EligibilityCriteria {
            id: row.id,
            tier_id: row.tier_id,
            app_type_id: row.app_type_id,
            net_earning_required: row.net_earning_required,
            evaluation_period_days: non_negative(
                "evaluation_period_days",
                row.evaluation_period_days,
            )?,
            consecutive_periods_required: non_negative(
                "consecutive_periods_required",
                row.consecutive_periods_required,
            )?,
            require_consecutive: row.require_consecutive,
            grace_periods_allowed: non_negative(
                "grace_periods_allowed",
                row.grace_periods_allowed,
            )?,
            is_active: row.is_active,
        };

        match criteria.lookback_days() {
            Some(days) if days <= MAX_LOOKBACK_DAYS => Ok(criteria),
            _ => Err(CoreError::Internal(format!(
                "Criteria {} looks back further than {MAX_LOOKBACK_DAYS} days",
                row.id
            ))),
        }
    }
}

/// DTO for creating a criteria record.
#[derive(Debug, Deserialize)]
pub struct CreateEligibilityCriteria {
    pub tier_id: DbId,
    pub app_type_id: Option<DbId>,
    pub net_earning_required: i64,
    pub evaluation_period_days: i32,
    pub consecutive_periods_required: i32,
    pub require_consecutive: Option<bool>,
    pub grace_periods_allowed: Option<i32>,
    pub is_active: Option<bool>,
}

impl CreateEligibilityCriteria {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_criteria_values(
            self.net_earning_required,
            self.evaluation_period_days,
            self.consecutive_periods_required,
            self.grace_periods_allowed.unwrap_or(0),
        )
    }
}

/// DTO for updating a criteria record. All fields optional.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateEligibilityCriteria {
    pub net_earning_required: Option<i64>,
    pub evaluation_period_days: Option<i32>,
    pub consecutive_periods_required: Option<i32>,
    pub require_consecutive: Option<bool>,
    pub grace_periods_allowed: Option<i32>,
    pub is_active: Option<bool>,
}

impl UpdateEligibilityCriteria {
    /// Validate the values the record would hold after applying this patch.
    pub fn validate_against(&self, existing: &EligibilityCriteriaRow) -> Result<(), CoreError> {
        validate_criteria_values(
            self.net_earning_required
                .unwrap_or(existing.net_earning_required),
            self.evaluation_period_days
                .unwrap_or(existing.evaluation_period_days),
            self.consecutive_periods_required
                .unwrap_or(existing.consecutive_periods_required),
            self.grace_periods_allowed
                .unwrap_or(existing.grace_periods_allowed),
        )
    }
}

/// Query filter for listing criteria.
#[derive(Debug, Default, Deserialize)]
pub struct CriteriaFilter {
    pub tier_id: Option<DbId>,
    pub app_type_id: Option<DbId>,
    pub active_only: Option<bool>,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;

    fn row() -> EligibilityCriteriaRow {
        EligibilityCriteriaRow {
            id: 3,
            tier_id: 2,
            app_type_id: Some(9),
            net_earning_required: 100,
            evaluation_period_days: 30,
            consecutive_periods_required: 3,
            require_consecutive: true,
            grace_periods_allowed: 1,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn row_converts_to_domain_criteria() {
        let criteria = EligibilityCriteria::try_from(row()).unwrap();
        assert_eq!(criteria.tier_id, 2);
        assert_eq!(criteria.app_type_id, Some(9));
        assert_eq!(criteria.evaluation_period_days, 30);
        assert_eq!(criteria.grace_periods_allowed, 1);
    }

    #[test]
    fn negative_column_is_internal_error() {
        let mut bad = row();
        bad.evaluation_period_days = -1;
        assert_matches!(EligibilityCriteria::try_from(bad), Err(CoreError::Internal(_)));
    }

    #[test]
    fn oversized_lookback_is_internal_error() {
        let mut bad = row();
        bad.evaluation_period_days = 100_000;
        bad.consecutive_periods_required = 1_000;
        assert_matches!(EligibilityCriteria::try_from(bad), Err(CoreError::Internal(_)));
    }

    #[test]
    fn lookback_at_maximum_converts() {
        let mut edge = row();
        edge.evaluation_period_days = 366;
        edge.consecutive_periods_required = 9;
        edge.grace_periods_allowed = 1;
        assert!(EligibilityCriteria::try_from(edge).is_ok());
    }

    #[test]
    fn update_is_validated_against_existing_values() {
        let patch = UpdateEligibilityCriteria {
            consecutive_periods_required: Some(0),
            ..Default::default()
        };
        assert!(patch.validate_against(&row()).is_err());

        let patch = UpdateEligibilityCriteria {
            net_earning_required: Some(500),
            ..Default::default()
        };
        assert!(patch.validate_against(&row()).is_ok());
    }

    #[test]
    fn create_defaults_grace_to_zero_for_validation() {
        let input = CreateEligibilityCriteria {
            tier_id: 1,
            app_type_id: None,
            net_earning_required: 0,
            evaluation_period_days: 30,
            consecutive_periods_required: 3,
            require_consecutive: None,
            grace_periods_allowed: None,
            is_active: None,
        };
        assert!(input.validate().is_ok());
    }
}
