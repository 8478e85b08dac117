//! Registration and login inputs plus their validation rules.

use std::fmt;

use serde::Deserialize;
use validator::Validate;

use crate::error::CoreError;

/// Default minimum password length when none is configured.
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 8;

const MIN_PHONE_LENGTH: usize = 6;
const MAX_PHONE_LENGTH: usize = 32;

/// Input for the register operation.
#[derive(Clone, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 200, message = "Business name must be 1-200 characters"))]
    pub business_name: String,
    pub business_phone: String,
    #[validate(email(message = "Email address is not valid"))]
    pub email: String,
    pub password: String,
}

/// Input for the login operation.
#[derive(Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

// Passwords must never reach logs through `{:?}`.
impl fmt::Debug for RegisterInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterInput")
            .field("business_name", &self.business_name)
            .field("business_phone", &self.business_phone)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginInput")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Validate a registration request.
///
/// Runs the derived field rules (name length, email syntax), then the phone
/// format and the configured password length.
pub fn validate_registration(
    input: &RegisterInput,
    min_password_length: usize,
) -> Result<(), CoreError> {
    if input.business_name.trim().is_empty() {
        return Err(CoreError::Validation(
            "Business name must not be blank".into(),
        ));
    }

    input
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;

    validate_phone(&input.business_phone)?;
    validate_password_strength(&input.password, min_password_length)
}

/// Accept digits, spaces, and `+-()` between 6 and 32 characters, with at
/// least one digit.
pub fn validate_phone(phone: &str) -> Result<(), CoreError> {
    let phone = phone.trim();
    let len = phone.chars().count();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'));

    if !(MIN_PHONE_LENGTH..=MAX_PHONE_LENGTH).contains(&len)
        || !allowed
        || !phone.chars().any(|c| c.is_ascii_digit())
    {
        return Err(CoreError::Validation(format!(
            "Phone must be {MIN_PHONE_LENGTH}-{MAX_PHONE_LENGTH} characters of digits, spaces, or +-()"
        )));
    }
    Ok(())
}

/// Enforce the minimum password length (counted in characters).
pub fn validate_password_strength(password: &str, min_length: usize) -> Result<(), CoreError> {
    if password.chars().count() < min_length {
        return Err(CoreError::Validation(format!(
            "Password must be at least {min_length} characters long"
        )));
    }
    Ok(())
}
