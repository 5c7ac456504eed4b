//! Input rules checked before any side effect takes place.

use crate::constants::{EMAIL_SEPARATOR, MIN_NAME_LENGTH};
use crate::error::{DomainError, DomainResult};

/// Reject addresses without an `@`.
pub fn validate_email(email: &str) -> DomainResult<()> {
    if !email.contains(EMAIL_SEPARATOR) {
        return Err(DomainError::validation("Invalid email format"));
    }
    Ok(())
}

/// Reject display names shorter than [`MIN_NAME_LENGTH`] characters.
pub fn validate_name(name: &str) -> DomainResult<()> {
    if name.chars().count() < MIN_NAME_LENGTH {
        return Err(DomainError::validation(format!(
            "Name must be at least {} characters",
            MIN_NAME_LENGTH
        )));
    }
    Ok(())
}
