//! Input rules applied before anything reaches a store.

use thiserror::Error;

pub const MIN_AGE: u32 = 18;
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("user must be at least {MIN_AGE} years old, got {0}")]
    Underage(u32),

    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,

    #[error("password must contain at least one digit")]
    PasswordMissingDigit,

    #[error("password must contain at least one uppercase letter")]
    PasswordMissingUppercase,

    #[error("{field} must be {rule}, got {value}")]
    OutOfRange {
        field: &'static str,
        rule: &'static str,
        value: i64,
    },

    #[error("order total does not fit in {field}")]
    TotalOverflow { field: &'static str },
}

pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(())
}

pub fn validate_age(age: u32) -> Result<(), ValidationError> {
    if age < MIN_AGE {
        return Err(ValidationError::Underage(age));
    }
    Ok(())
}

/// Length is counted in characters; digit and uppercase checks are ASCII only.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::PasswordMissingDigit);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::PasswordMissingUppercase);
    }
    Ok(())
}

/// Converts a wire quantity into stock units, rejecting anything below `min`.
pub fn quantity_at_least(field: &'static str, value: i64, min: u32) -> Result<u32, ValidationError> {
    let rule = if min == 0 { "non-negative" } else { "positive" };
    if value < i64::from(min) {
        return Err(ValidationError::OutOfRange { field, rule, value });
    }
    u32::try_from(value).map_err(|_| ValidationError::OutOfRange {
        field,
        rule: "within u32 range",
        value,
    })
}

pub fn non_negative_cents(field: &'static str, value: i64) -> Result<i64, ValidationError> {
    if value < 0 {
        return Err(ValidationError::OutOfRange {
            field,
            rule: "non-negative",
            value,
        });
    }
    Ok(value)
}
