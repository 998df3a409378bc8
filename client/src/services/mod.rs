//! Backend Services
//!
//! The hosted identity, storage and document services the flows orchestrate.
//! Flows only see these traits; concrete adapters live in the submodules.

mod firestore;
mod identity;
mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use natter_common::{message_for_code, Account, AccountId, Document, ProfileUpdate};
use thiserror::Error;

pub use firestore::FirestoreDocumentStore;
pub use identity::{IdToken, RestIdentityClient, TokenStore};
pub use s3::S3Storage;

/// Error reported by a backend service.
///
/// `code` is the backend's error identifier (e.g. `auth/email-already-in-use`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ServiceError {
    /// Machine-readable error code.
    pub code: String,
    /// Diagnostic detail (not meant for display).
    pub message: String,
}

impl ServiceError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> &'static str {
        message_for_code(&self.code)
    }
}

/// Result type for service calls.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Account creation and profile attributes.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Create an account. The identity service rejects atomically: on error
    /// no account exists.
    async fn create_account(&self, email: &str, password: &str) -> ServiceResult<Account>;

    /// Update profile attributes of `account`.
    async fn update_profile(&self, account: &Account, update: &ProfileUpdate)
        -> ServiceResult<()>;
}

/// Binary object storage.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Upload `data` under `key`, resolving once the upload completes.
    async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> ServiceResult<()>;

    /// Publicly resolvable URL for `key`.
    async fn download_url(&self, key: &str) -> ServiceResult<String>;
}

/// Keyed document persistence.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create or replace the document at `collection/key`.
    async fn write(&self, collection: &str, key: &str, record: serde_json::Value)
        -> ServiceResult<()>;
}

/// Write a typed document keyed by account.
pub async fn write_document<D: Document + Sync>(
    store: &dyn DocumentStore,
    key: &AccountId,
    document: &D,
) -> ServiceResult<()> {
    let record = serde_json::to_value(document)
        .map_err(|e| ServiceError::new("invalid-argument", e.to_string()))?;
    store.write(D::COLLECTION, key.as_str(), record).await
}
