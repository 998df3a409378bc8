//! Account and Profile Types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque account identifier assigned by the identity service.
///
/// Immutable for the lifetime of the account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Projection of an identity-service account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Email address the account was created with.
    pub email: String,
    /// Display name (absent until set after creation).
    pub display_name: Option<String>,
    /// Profile photo URL.
    pub photo_url: Option<String>,
}

impl Account {
    /// Display name, or an empty string when none has been set.
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or_default()
    }

    /// Apply a profile patch locally. Fields left as `None` are untouched.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(name) = &update.display_name {
            self.display_name = Some(name.clone());
        }
        if let Some(url) = &update.photo_url {
            self.photo_url = Some(url.clone());
        }
    }
}

/// Profile attribute patch sent to the identity service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// New photo URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl ProfileUpdate {
    pub fn display_name(name: impl Into<String>) -> Self {
        Self {
            display_name: Some(name.into()),
            photo_url: None,
        }
    }

    #[must_use]
    pub fn with_photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }

    pub const fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.photo_url.is_none()
    }
}

/// A record persisted in the document store under a fixed collection.
pub trait Document: Serialize {
    /// Collection the document lives in.
    const COLLECTION: &'static str;
}

/// Denormalized profile snapshot written once at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileDocument {
    pub user_id: AccountId,
    pub user_name: String,
    pub email: String,
}

impl Document for UserProfileDocument {
    const COLLECTION: &'static str = "users";
}

/// Empty chat history placeholder created at registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHistoryDocument {}

impl Document for ChatHistoryDocument {
    const COLLECTION: &'static str = "chatHistory";
}
