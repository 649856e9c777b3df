//! Validation utilities

use crate::types::{CoreError, CoreResult};
use bigdecimal::BigDecimal;

/// Validate that an amount is positive
pub fn validate_positive_amount(amount: &BigDecimal) -> CoreResult<()> {
    if *amount <= BigDecimal::from(0) {
        Err(CoreError::Validation("Amount must be positive".to_string()))
    } else {
        Ok(())
    }
}

/// Validate a node or account name
pub fn validate_name(name: &str) -> CoreResult<()> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation("Name cannot be empty".to_string()));
    }

    if name.chars().count() > 100 {
        return Err(CoreError::Validation(
            "Name cannot exceed 100 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate a posting or document description
pub fn validate_description(description: &str) -> CoreResult<()> {
    if description.trim().is_empty() {
        return Err(CoreError::Validation(
            "Description cannot be empty".to_string(),
        ));
    }

    if description.chars().count() > 500 {
        return Err(CoreError::Validation(
            "Description cannot exceed 500 characters".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_amounts() {
        assert!(validate_positive_amount(&BigDecimal::from(1)).is_ok());
        assert!(validate_positive_amount(&BigDecimal::from(0)).is_err());
        assert!(validate_positive_amount(&BigDecimal::from(-5)).is_err());
    }

    #[test]
    fn accepts_persian_names_and_counts_characters() {
        assert!(validate_name("صندوق").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"ه".repeat(101)).is_err());
        assert!(validate_name(&"ه".repeat(100)).is_ok());
    }

    #[test]
    fn descriptions_must_be_present_and_bounded() {
        assert!(validate_description("واریز قسط").is_ok());
        assert!(validate_description("").is_err());
        assert!(validate_description(&"x".repeat(501)).is_err());
    }
}
