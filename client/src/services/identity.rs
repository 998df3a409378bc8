//! Identity Toolkit REST Client
//!
//! Account creation and profile updates against the hosted identity
//! toolkit REST API (`accounts:signUp`, `accounts:update`).

use std::sync::Arc;

use async_trait::async_trait;
use natter_common::{Account, AccountId, ProfileUpdate};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, error};
use url::Url;

use super::{IdentityService, ServiceError, ServiceResult};
use crate::util::base_url;

/// ID token of the signed-in account.
#[derive(Clone)]
pub struct IdToken {
    pub account_id: AccountId,
    pub token: String,
}

impl std::fmt::Debug for IdToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdToken")
            .field("account_id", &self.account_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Shared slot for the signed-in account's ID token.
///
/// Filled by [`RestIdentityClient`] on account creation and read by the
/// document adapter to authorize writes.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    inner: Arc<RwLock<Option<IdToken>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, token: IdToken) {
        *self.inner.write().await = Some(token);
    }

    pub async fn get(&self) -> Option<IdToken> {
        self.inner.read().await.clone()
    }

    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

/// Sign-up response from the identity toolkit.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    local_id: String,
    id_token: String,
    email: Option<String>,
}

/// Error envelope returned by the identity toolkit.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Identity service backed by the identity toolkit REST API.
#[derive(Clone)]
pub struct RestIdentityClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
    tokens: TokenStore,
}

impl RestIdentityClient {
    pub fn new(
        http: HttpClient,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        tokens: TokenStore,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            tokens,
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/accounts:{method}", base_url(&self.base_url))
    }

    /// Endpoint URL with the API key as a query parameter.
    fn request_url(&self, method: &str) -> ServiceResult<Url> {
        let mut url = Url::parse(&self.endpoint(method)).map_err(|e| {
            ServiceError::new("auth/internal-error", format!("Bad identity URL: {e}"))
        })?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> ServiceResult<T> {
        let response = self
            .http
            .post(self.request_url(method)?)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(method, "Identity request failed: {}", e);
                ServiceError::new("auth/network-request-failed", e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(method, %status, "Identity request rejected: {}", body);
            return Err(parse_error(&body));
        }

        response.json().await.map_err(|e| {
            error!(method, "Failed to parse identity response: {}", e);
            ServiceError::new("auth/internal-error", format!("Invalid response: {e}"))
        })
    }
}

#[async_trait]
impl IdentityService for RestIdentityClient {
    async fn create_account(&self, email: &str, password: &str) -> ServiceResult<Account> {
        let created: SignUpResponse = self
            .post(
                "signUp",
                serde_json::json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true
                }),
            )
            .await?;

        let account_id = AccountId::new(created.local_id);
        self.tokens
            .set(IdToken {
                account_id: account_id.clone(),
                token: created.id_token,
            })
            .await;

        debug!(account_id = %account_id, "Account created");

        Ok(Account {
            id: account_id,
            email: created.email.unwrap_or_else(|| email.to_string()),
            display_name: None,
            photo_url: None,
        })
    }

    async fn update_profile(
        &self,
        account: &Account,
        update: &ProfileUpdate,
    ) -> ServiceResult<()> {
        let token = self
            .tokens
            .get()
            .await
            .filter(|t| t.account_id == account.id)
            .ok_or_else(|| {
                ServiceError::new(
                    "auth/user-token-expired",
                    format!("No ID token held for account {}", account.id),
                )
            })?;

        let mut body = serde_json::json!({
            "idToken": token.token,
            "returnSecureToken": false
        });
        if let Some(name) = &update.display_name {
            body["displayName"] = name.as_str().into();
        }
        if let Some(url) = &update.photo_url {
            body["photoUrl"] = url.as_str().into();
        }

        let _: serde_json::Value = self.post("update", body).await?;
        debug!(account_id = %account.id, "Profile updated");
        Ok(())
    }
}

/// Normalize an identity toolkit error body into an `auth/*` code.
///
/// Messages look like `EMAIL_EXISTS` or `WEAK_PASSWORD : Password should be ...`.
fn parse_error(body: &str) -> ServiceError {
    let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) else {
        return ServiceError::new("auth/internal-error", body.to_string());
    };

    let message = envelope.error.message;
    let identifier = message.split(" : ").next().unwrap_or_default().trim();
    let code = match identifier {
        "EMAIL_EXISTS" => "auth/email-already-in-use",
        "INVALID_EMAIL" => "auth/invalid-email",
        "WEAK_PASSWORD" => "auth/weak-password",
        "OPERATION_NOT_ALLOWED" | "PASSWORD_LOGIN_DISABLED" => "auth/operation-not-allowed",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "auth/too-many-requests",
        "USER_DISABLED" => "auth/user-disabled",
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => {
            "auth/user-token-expired"
        }
        "USER_NOT_FOUND" => "auth/user-not-found",
        _ => "auth/internal-error",
    };

    ServiceError::new(code, message)
}
