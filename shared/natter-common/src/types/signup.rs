//! Sign-up Form Types

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Raw sign-up form input, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUpCandidate {
    /// Display name.
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    /// Email address.
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    /// Password.
    pub password: String,
    /// Password confirmation.
    pub password_verification: String,
}

/// Sign-up input accepted by [`crate::validate_sign_up`].
///
/// Only constructible through validation, so holding one means every field
/// passed the schema and both passwords match.
#[derive(Clone, PartialEq, Eq)]
pub struct SignUpInformation {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password: String,
}

impl SignUpInformation {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for SignUpInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignUpInformation")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Sign-up form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignUpField {
    Username,
    Email,
    Password,
    PasswordVerification,
}

impl SignUpField {
    /// Wire name of the field, as used by the form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Email => "email",
            Self::Password => "password",
            Self::PasswordVerification => "passwordVerification",
        }
    }

    /// Map a struct field name (as reported by `validator`) back to the form field.
    pub(crate) fn from_struct_field(name: &str) -> Option<Self> {
        match name {
            "username" => Some(Self::Username),
            "email" => Some(Self::Email),
            "password" => Some(Self::Password),
            "password_verification" => Some(Self::PasswordVerification),
            _ => None,
        }
    }
}

impl fmt::Display for SignUpField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level validation messages, one per failing field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<SignUpField, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field` unless one is already present.
    pub fn add(&mut self, field: SignUpField, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: SignUpField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: SignUpField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SignUpField, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}
