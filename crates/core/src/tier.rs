//! Tier field validation.

use crate::error::CoreError;

/// Longest accepted tier name, in characters.
pub const MAX_TIER_NAME_LEN: usize = 100;

/// Validate a tier name: non-blank and at most [`MAX_TIER_NAME_LEN`] chars.
pub fn validate_tier_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Tier name must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_TIER_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Tier name must be at most {MAX_TIER_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate the points threshold of a tier.
pub fn validate_points_required(points_required: i64) -> Result<(), CoreError> {
    if points_required < 0 {
        return Err(CoreError::Validation(format!(
            "points_required must be >= 0, got {points_required}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_name_rejected() {
        assert!(validate_tier_name("   ").is_err());
    }

    #[test]
    fn long_name_rejected() {
        assert!(validate_tier_name(&"x".repeat(MAX_TIER_NAME_LEN + 1)).is_err());
        assert!(validate_tier_name(&"x".repeat(MAX_TIER_NAME_LEN)).is_ok());
    }

    #[test]
    fn negative_points_rejected() {
        assert!(validate_points_required(-5).is_err());
        assert!(validate_points_required(0).is_ok());
    }
}
