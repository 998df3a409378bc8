//! Sign-up Validation
//!
//! Pure, total validation of the sign-up form. Never performs I/O.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::{FieldErrors, SignUpCandidate, SignUpField, SignUpInformation};

/// Minimum password strength.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordPolicy {
    /// Minimum length in characters.
    pub min_length: usize,
    /// Maximum length in characters.
    pub max_length: usize,
    /// Require at least one alphabetic character.
    pub require_letter: bool,
    /// Require at least one ASCII digit.
    pub require_digit: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
            require_letter: true,
            require_digit: true,
        }
    }
}

impl PasswordPolicy {
    /// Check `password` against the policy, returning the first violated rule.
    pub fn check(&self, password: &str) -> Result<(), String> {
        let length = password.chars().count();
        if length < self.min_length {
            return Err(format!(
                "Password must be at least {} characters",
                self.min_length
            ));
        }
        if length > self.max_length {
            return Err(format!(
                "Password must be at most {} characters",
                self.max_length
            ));
        }
        if self.require_letter && !password.chars().any(char::is_alphabetic) {
            return Err("Password must contain at least one letter".to_string());
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err("Password must contain at least one number".to_string());
        }
        Ok(())
    }
}

/// Validate a sign-up candidate.
///
/// Every failing field is reported. The password confirmation is compared on
/// its own, so a mismatch is flagged even when other fields are invalid.
pub fn validate_sign_up(
    candidate: &SignUpCandidate,
    policy: &PasswordPolicy,
) -> Result<SignUpInformation, FieldErrors> {
    let mut errors = FieldErrors::new();

    if let Err(report) = candidate.validate() {
        for (name, failures) in report.field_errors() {
            let Some(field) = SignUpField::from_struct_field(&name) else {
                continue;
            };
            let message = failures
                .iter()
                .find_map(|failure| failure.message.as_deref().map(str::to_string))
                .unwrap_or_else(|| format!("Invalid {field}"));
            errors.add(field, message);
        }
    }

    if candidate.username.trim().is_empty() {
        errors.add(SignUpField::Username, "Username is required");
    }

    if let Err(message) = policy.check(&candidate.password) {
        errors.add(SignUpField::Password, message);
    }

    if candidate.password_verification != candidate.password {
        errors.add(SignUpField::PasswordVerification, "Passwords do not match");
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(SignUpInformation {
        username: candidate.username.clone(),
        email: candidate.email.clone(),
        password: candidate.password.clone(),
    })
}
