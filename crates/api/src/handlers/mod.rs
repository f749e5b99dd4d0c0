pub mod eligibility;
pub mod eligibility_criteria;
pub mod tiers;
