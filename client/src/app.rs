//! Client application state.
//!
//! Owns the session and the backend adapters, and hands out page flows that
//! share them.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use natter_common::PasswordPolicy;
use reqwest::Client as HttpClient;
use tracing::{debug, info};

use crate::config::{AvatarSettings, ClientConfig};
use crate::flows::{ProfileImageFlow, SignUpFlow};
use crate::services::{
    DocumentStore, FirestoreDocumentStore, IdentityService, RestIdentityClient, S3Storage,
    StorageService, TokenStore,
};
use crate::session::Session;

/// HTTP request timeout for identity and document calls.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state shared by every page.
#[derive(Clone)]
pub struct NatterClient {
    session: Session,
    identity: Arc<dyn IdentityService>,
    storage: Arc<dyn StorageService>,
    documents: Arc<dyn DocumentStore>,
    password_policy: PasswordPolicy,
    avatar: AvatarSettings,
}

impl NatterClient {
    /// Build the client against the hosted services named in `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;
        let tokens = TokenStore::new();

        let identity = RestIdentityClient::new(
            http.clone(),
            config.identity_base_url.clone(),
            config.identity_api_key.clone(),
            tokens.clone(),
        );
        let documents = FirestoreDocumentStore::new(
            http,
            config.firestore_base_url.clone(),
            config.firestore_project_id.clone(),
            tokens.clone(),
        );
        let storage = S3Storage::new(config);

        info!(
            project = %config.firestore_project_id,
            bucket = %storage.bucket(),
            "Natter client initialized"
        );

        Ok(Self::with_session(
            config,
            Session::with_tokens(tokens),
            Arc::new(identity),
            Arc::new(storage),
            Arc::new(documents),
        ))
    }

    /// Load `.env`, read the configuration and install logging.
    ///
    /// A subscriber installed earlier by the embedding application is kept.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = ClientConfig::from_env()?;
        if let Err(e) = crate::telemetry::init_tracing(config.log_format) {
            debug!("Keeping existing tracing subscriber: {}", e);
        }
        Self::from_config(&config)
    }

    /// Build the client over caller-supplied services.
    pub fn with_services(
        config: &ClientConfig,
        identity: Arc<dyn IdentityService>,
        storage: Arc<dyn StorageService>,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        Self::with_session(config, Session::new(), identity, storage, documents)
    }

    fn with_session(
        config: &ClientConfig,
        session: Session,
        identity: Arc<dyn IdentityService>,
        storage: Arc<dyn StorageService>,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            session,
            identity,
            storage,
            documents,
            password_policy: config.password_policy.clone(),
            avatar: config.avatar.clone(),
        }
    }

    /// The session shared by all flows of this client.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Controller for the sign-up page.
    pub fn sign_up_flow(&self) -> SignUpFlow {
        SignUpFlow::new(
            self.session.clone(),
            Arc::clone(&self.identity),
            Arc::clone(&self.documents),
            self.password_policy.clone(),
        )
    }

    /// Controller for the profile page's image picker.
    pub fn profile_image_flow(&self) -> ProfileImageFlow {
        ProfileImageFlow::new(
            self.session.clone(),
            Arc::clone(&self.identity),
            Arc::clone(&self.storage),
            self.avatar.clone(),
        )
    }
}
