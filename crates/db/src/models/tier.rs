//! Loyalty tier model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use loyalty_core::types::{DbId, Timestamp};

/// A row from the `tiers` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tier {
    pub id: DbId,
    pub name: String,
    pub points_required: i64,
    pub description: Vec<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a tier.
#[derive(Debug, Deserialize)]
pub struct CreateTier {
    pub name: String,
    pub points_required: i64,
    pub description: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// DTO for updating a tier. All fields optional.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTier {
    pub name: Option<String>,
    pub points_required: Option<i64>,
    pub description: Option<Vec<String>>,
    pub is_active: Option<bool>,
}
