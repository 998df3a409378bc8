//! In-memory backend for flow tests.
//!
//! `FakeBackend` implements every service trait, records each call in order
//! and fails on request.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use natter_client::{
    ClientConfig, DocumentStore, IdentityService, NatterClient, ServiceError, ServiceResult,
    StorageService,
};
use natter_common::{Account, AccountId, ProfileUpdate, SignUpCandidate};
use tokio::sync::Notify;

/// PNG file signature followed by filler.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

/// JPEG start-of-image marker followed by filler.
pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

/// Account id the fake identity service assigns.
pub const NEW_ACCOUNT_ID: &str = "uid-new";

/// One recorded service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateAccount { email: String },
    UpdateProfile { account_id: String, update: ProfileUpdate },
    WriteDocument { collection: String, key: String, record: serde_json::Value },
    Upload { key: String, content_type: String, size: usize },
    DownloadUrl { key: String },
}

#[derive(Default)]
struct Failures {
    create_account: Option<ServiceError>,
    update_profile: Option<ServiceError>,
    write_collection: Option<(String, ServiceError)>,
    upload: Option<ServiceError>,
    download_url: Option<ServiceError>,
}

/// Recording stand-in for the identity, storage and document services.
#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<Call>>,
    failures: Mutex<Failures>,
    objects: Mutex<HashMap<String, Bytes>>,
    create_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn documents(&self) -> Vec<(String, String, serde_json::Value)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::WriteDocument { collection, key, record } => Some((collection, key, record)),
                _ => None,
            })
            .collect()
    }

    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn fail_create_account(&self, code: &str) {
        self.failures.lock().unwrap().create_account = Some(ServiceError::new(code, "injected"));
    }

    pub fn fail_update_profile(&self, code: &str) {
        self.failures.lock().unwrap().update_profile = Some(ServiceError::new(code, "injected"));
    }

    pub fn fail_write(&self, collection: &str, code: &str) {
        self.failures.lock().unwrap().write_collection =
            Some((collection.to_string(), ServiceError::new(code, "injected")));
    }

    pub fn fail_upload(&self, code: &str) {
        self.failures.lock().unwrap().upload = Some(ServiceError::new(code, "injected"));
    }

    pub fn fail_download_url(&self, code: &str) {
        self.failures.lock().unwrap().download_url = Some(ServiceError::new(code, "injected"));
    }

    /// Make `create_account` wait until the returned handle is notified.
    pub fn hold_create_account(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.create_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

/// Download URL the fake storage hands out for `key`.
pub fn download_url_for(key: &str) -> String {
    format!("https://storage.test/natter/{}", key.replace(' ', "%20"))
}

#[async_trait]
impl IdentityService for FakeBackend {
    async fn create_account(&self, email: &str, _password: &str) -> ServiceResult<Account> {
        self.record(Call::CreateAccount {
            email: email.to_string(),
        });

        let gate = self.create_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if let Some(err) = self.failures.lock().unwrap().create_account.clone() {
            return Err(err);
        }
        Ok(Account {
            id: AccountId::new(NEW_ACCOUNT_ID),
            email: email.to_string(),
            display_name: None,
            photo_url: None,
        })
    }

    async fn update_profile(&self, account: &Account, update: &ProfileUpdate) -> ServiceResult<()> {
        self.record(Call::UpdateProfile {
            account_id: account.id.to_string(),
            update: update.clone(),
        });
        match self.failures.lock().unwrap().update_profile.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StorageService for FakeBackend {
    async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> ServiceResult<()> {
        self.record(Call::Upload {
            key: key.to_string(),
            content_type: content_type.to_string(),
            size: data.len(),
        });
        if let Some(err) = self.failures.lock().unwrap().upload.clone() {
            return Err(err);
        }
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn download_url(&self, key: &str) -> ServiceResult<String> {
        self.record(Call::DownloadUrl {
            key: key.to_string(),
        });
        if let Some(err) = self.failures.lock().unwrap().download_url.clone() {
            return Err(err);
        }
        if !self.objects.lock().unwrap().contains_key(key) {
            return Err(ServiceError::new("storage/object-not-found", key));
        }
        Ok(download_url_for(key))
    }
}

#[async_trait]
impl DocumentStore for FakeBackend {
    async fn write(
        &self,
        collection: &str,
        key: &str,
        record: serde_json::Value,
    ) -> ServiceResult<()> {
        self.record(Call::WriteDocument {
            collection: collection.to_string(),
            key: key.to_string(),
            record,
        });
        let failures = self.failures.lock().unwrap();
        match &failures.write_collection {
            Some((failing, err)) if failing == collection => Err(err.clone()),
            _ => Ok(()),
        }
    }
}

/// Client wired to `backend` for all three services.
pub fn client_with(backend: &Arc<FakeBackend>, config: &ClientConfig) -> NatterClient {
    NatterClient::with_services(
        config,
        Arc::clone(backend) as Arc<dyn IdentityService>,
        Arc::clone(backend) as Arc<dyn StorageService>,
        Arc::clone(backend) as Arc<dyn DocumentStore>,
    )
}

/// Client with test configuration.
pub fn test_client(backend: &Arc<FakeBackend>) -> NatterClient {
    client_with(backend, &ClientConfig::default_for_test())
}

/// A sign-up form that passes validation.
pub fn valid_candidate() -> SignUpCandidate {
    SignUpCandidate {
        username: "Ada Lovelace".into(),
        email: "ada@example.com".into(),
        password: "analytical1".into(),
        password_verification: "analytical1".into(),
    }
}

/// A signed-in account with a display name.
pub fn signed_in_account() -> Account {
    Account {
        id: AccountId::new("uid-ada"),
        email: "ada@example.com".into(),
        display_name: Some("Ada Lovelace".into()),
        photo_url: None,
    }
}
