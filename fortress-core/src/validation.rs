//! Input validation for credentials arriving at the HTTP surface.
//!
//! Validation failures map to HTTP 400 and are safe to echo back to the
//! client; they never concern stored state.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // Pragmatic format check, not full RFC 5322.
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
});

/// Passwords matching these exactly (case-insensitively) are rejected
/// outright.
const WEAK_PASSWORDS: &[&str] = &[
    "password", "123456", "12345678", "qwerty", "abc123", "letmein", "welcome",
];

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Check that `email` is plausibly an email address.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::MissingField("email".to_string()));
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

/// Enforce the password policy: minimum length, no known-weak passwords,
/// no single repeated character, and letters combined with digits or
/// specials.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::WeakPassword(format!(
            "must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    let lowered = password.to_lowercase();
    if WEAK_PASSWORDS.contains(&lowered.as_str()) {
        return Err(ValidationError::WeakPassword(
            "too common; choose a stronger password".to_string(),
        ));
    }

    let mut chars = password.chars();
    let first = chars.next();
    if first.is_some() && chars.all(|c| Some(c) == first) {
        return Err(ValidationError::WeakPassword(
            "cannot use the same character repeated".to_string(),
        ));
    }

    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| "!@#$%^&*()_+-=[]{}|;:,.<>?".contains(c));
    if !(has_letter && (has_digit || has_special)) {
        return Err(ValidationError::WeakPassword(
            "must contain letters and numbers or special characters".to_string(),
        ));
    }

    Ok(())
}
