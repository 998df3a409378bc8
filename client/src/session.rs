//! Session context.
//!
//! Holds the signed-in account and its ID token. Passed explicitly to every
//! flow.

use std::sync::Arc;

use natter_common::{string_avatar, Account, AvatarLabel, ProfileUpdate};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::services::{IdToken, TokenStore};

/// Handle to the current session. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    current: Arc<RwLock<Option<Account>>>,
    tokens: TokenStore,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session whose ID token lives in `tokens`, shared with the backend
    /// adapters.
    pub fn with_tokens(tokens: TokenStore) -> Self {
        Self {
            current: Arc::default(),
            tokens,
        }
    }

    /// Session already signed in as `account`.
    pub fn signed_in(account: Account) -> Self {
        Self {
            current: Arc::new(RwLock::new(Some(account))),
            tokens: TokenStore::new(),
        }
    }

    /// Token slot read by the backend adapters.
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub async fn current_account(&self) -> Option<Account> {
        self.current.read().await.clone()
    }

    pub async fn is_signed_in(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Make `account` current. A token held for a different account is
    /// dropped.
    pub async fn sign_in(&self, account: Account) {
        if self
            .tokens
            .get()
            .await
            .is_some_and(|token| token.account_id != account.id)
        {
            self.tokens.clear().await;
        }
        *self.current.write().await = Some(account);
    }

    /// Resume a previously authenticated account with its ID token.
    pub async fn restore(&self, account: Account, id_token: impl Into<String>) {
        self.tokens
            .set(IdToken {
                account_id: account.id.clone(),
                token: id_token.into(),
            })
            .await;
        *self.current.write().await = Some(account);
    }

    pub async fn sign_out(&self) {
        *self.current.write().await = None;
        self.tokens.clear().await;
    }

    /// Apply a profile patch to the signed-in account, returning the result.
    pub async fn apply_update(&self, update: &ProfileUpdate) -> Option<Account> {
        let mut current = self.current.write().await;
        let account = current.as_mut()?;
        account.apply(update);
        Some(account.clone())
    }

    /// Header shown at the top of every page.
    pub async fn profile_header(&self) -> ProfileHeader {
        let current = self.current.read().await;
        let name = current
            .as_ref()
            .map(|a| a.name().to_string())
            .unwrap_or_default();
        let photo_url = current.as_ref().and_then(|a| a.photo_url.clone());

        ProfileHeader {
            avatar: string_avatar(&name),
            name,
            photo_url,
        }
    }
}

/// What the page header renders for the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileHeader {
    /// Display name (empty when signed out).
    pub name: String,
    /// Letter avatar used when there is no photo.
    pub avatar: AvatarLabel,
    /// Profile photo URL.
    pub photo_url: Option<String>,
}
