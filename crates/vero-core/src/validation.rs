//! # Validation Module
//!
//! Input validation utilities for the settlement engine. Services validate
//! here before touching storage; the database constraints are the second
//! line, not the first.

use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;
use crate::DESCRIPTION_MAX_LEN;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a register description or ledger memo.
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most [`DESCRIPTION_MAX_LEN`] characters
///
/// ## Example
/// ```rust
/// use vero_core::validation::validate_description;
///
/// assert!(validate_description("memo", "Register opening float").is_ok());
/// assert!(validate_description("memo", "   ").is_err());
/// ```
pub fn validate_description(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > DESCRIPTION_MAX_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: DESCRIPTION_MAX_LEN,
        });
    }

    Ok(())
}

/// Strips everything but ASCII digits.
///
/// Bank agency and account numbers arrive formatted ("1234-5", "04.321/0");
/// they are stored digits-only.
///
/// ## Example
/// ```rust
/// use vero_core::validation::normalize_digits;
///
/// assert_eq!(normalize_digits("1234-5"), "12345");
/// assert_eq!(normalize_digits("04.321/0"), "043210");
/// ```
pub fn normalize_digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

// =============================================================================
// Amount Validators
// =============================================================================

/// Requires a strictly positive amount.
///
/// ## Example
/// ```rust
/// use vero_core::money::Money;
/// use vero_core::validation::validate_positive_amount;
///
/// assert!(validate_positive_amount("amount", Money::from_cents(1)).is_ok());
/// assert!(validate_positive_amount("amount", Money::zero()).is_err());
/// ```
pub fn validate_positive_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_rules() {
        assert!(validate_description("description", "Daily till").is_ok());
        assert!(validate_description("description", "").is_err());
        assert!(validate_description("description", "  \t ").is_err());

        let long = "x".repeat(DESCRIPTION_MAX_LEN + 1);
        assert!(matches!(
            validate_description("description", &long),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn digit_normalization() {
        assert_eq!(normalize_digits("1234-5"), "12345");
        assert_eq!(normalize_digits("ag. 001"), "001");
        assert_eq!(normalize_digits(""), "");
        assert_eq!(normalize_digits("abc"), "");
    }

    #[test]
    fn positive_amounts() {
        assert!(validate_positive_amount("amount", Money::from_cents(100)).is_ok());
        assert!(validate_positive_amount("amount", Money::zero()).is_err());
        assert!(validate_positive_amount("amount", Money::from_cents(-1)).is_err());
    }
}
