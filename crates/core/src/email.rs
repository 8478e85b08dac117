//! Email normalization.
//!
//! Emails are compared case-insensitively. The normalized form is what gets
//! stored and looked up; the unique index on `lower(email)` backs it up at
//! the storage layer.

/// Trim surrounding whitespace and lower-case the address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
