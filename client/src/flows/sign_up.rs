//! Account registration.
//!
//! Validates the sign-up form, then runs four remote steps in order:
//! create the account, set its display name, write the profile document and
//! write the empty chat history document. Steps are not compensated: if a
//! later step fails, the account and any earlier writes stay in place and
//! the error names the step that failed.

use std::fmt;
use std::sync::Arc;

use natter_common::{
    validate_sign_up, Account, AccountId, ChatHistoryDocument, FieldErrors, PasswordPolicy,
    ProfileUpdate, Route, SignUpCandidate, SignUpInformation, UserProfileDocument,
};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::services::{write_document, DocumentStore, IdentityService, ServiceError};
use crate::session::Session;

/// Where the registration attempt is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignUpPhase {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// Observable sign-up state rendered by the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignUpState {
    pub phase: SignUpPhase,
    /// Per-field validation messages from the last submit.
    pub field_errors: FieldErrors,
    /// User-facing message for the last remote failure.
    pub auth_error: Option<String>,
    /// Set once registration succeeds.
    pub redirect: Option<Route>,
}

impl SignUpState {
    /// True while a submission is in flight; the submit button is disabled.
    pub fn is_busy(&self) -> bool {
        self.phase == SignUpPhase::Submitting
    }
}

/// Remote step that ran after the account already existed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStep {
    SetDisplayName,
    WriteUserProfile,
    WriteChatHistory,
}

impl fmt::Display for RegistrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SetDisplayName => "setting the display name",
            Self::WriteUserProfile => "writing the user profile",
            Self::WriteChatHistory => "creating the chat history",
        })
    }
}

/// Registration failures.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The form did not pass validation. No remote call was made.
    #[error("Sign-up form is invalid: {0}")]
    Invalid(FieldErrors),

    /// A previous submission is still running.
    #[error("Registration already in progress")]
    InProgress,

    /// The identity service refused to create the account.
    #[error("Account creation failed: {0}")]
    AccountCreation(#[source] ServiceError),

    /// The account exists but a follow-up step failed.
    #[error("Account {account_id} was created but {step} failed: {source}")]
    PostCreation {
        account_id: AccountId,
        step: RegistrationStep,
        #[source]
        source: ServiceError,
    },
}

impl RegistrationError {
    /// Backend error behind this failure, if any.
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            Self::AccountCreation(source) | Self::PostCreation { source, .. } => Some(source),
            Self::Invalid(_) | Self::InProgress => None,
        }
    }
}

/// Sign-up form controller.
pub struct SignUpFlow {
    session: Session,
    identity: Arc<dyn IdentityService>,
    documents: Arc<dyn DocumentStore>,
    policy: PasswordPolicy,
    state: watch::Sender<SignUpState>,
}

impl SignUpFlow {
    pub fn new(
        session: Session,
        identity: Arc<dyn IdentityService>,
        documents: Arc<dyn DocumentStore>,
        policy: PasswordPolicy,
    ) -> Self {
        Self {
            session,
            identity,
            documents,
            policy,
            state: watch::Sender::new(SignUpState::default()),
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> SignUpState {
        self.state.borrow().clone()
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<SignUpState> {
        self.state.subscribe()
    }

    /// Validate and register.
    ///
    /// Outcome is published to the observable state as well as returned.
    #[tracing::instrument(skip_all, fields(email = %candidate.email))]
    pub async fn submit(&self, candidate: SignUpCandidate) -> Result<Account, RegistrationError> {
        // A running registration's state is never touched by another submit.
        let mut claimed = Err(RegistrationError::InProgress);
        self.state.send_if_modified(|state| {
            if state.is_busy() {
                return false;
            }
            match validate_sign_up(&candidate, &self.policy) {
                Ok(info) => {
                    *state = SignUpState {
                        phase: SignUpPhase::Submitting,
                        ..SignUpState::default()
                    };
                    claimed = Ok(info);
                }
                Err(errors) => {
                    state.field_errors = errors.clone();
                    state.auth_error = None;
                    claimed = Err(RegistrationError::Invalid(errors));
                }
            }
            true
        });

        let info = match claimed {
            Ok(info) => info,
            Err(RegistrationError::Invalid(errors)) => {
                warn!(fields = %errors, "Sign-up form rejected");
                return Err(RegistrationError::Invalid(errors));
            }
            Err(e) => {
                warn!("Sign-up submitted while a registration is running");
                return Err(e);
            }
        };

        let result = self.register(&info).await;

        self.state.send_modify(|state| match &result {
            Ok(_) => {
                state.phase = SignUpPhase::Succeeded;
                state.redirect = Some(Route::Home);
            }
            Err(e) => {
                state.phase = SignUpPhase::Failed;
                state.auth_error = e
                    .service_error()
                    .map(|source| source.user_message().to_string());
            }
        });

        result
    }

    async fn register(&self, info: &SignUpInformation) -> Result<Account, RegistrationError> {
        let mut account = self
            .identity
            .create_account(info.email(), info.password())
            .await
            .map_err(|e| {
                error!(code = %e.code, "Account creation failed: {}", e.message);
                RegistrationError::AccountCreation(e)
            })?;
        self.session.sign_in(account.clone()).await;

        let fail = |step: RegistrationStep, account_id: &AccountId| {
            let account_id = account_id.clone();
            move |source: ServiceError| {
                error!(
                    account_id = %account_id,
                    %step,
                    code = %source.code,
                    "Registration step failed, account left partially initialized"
                );
                RegistrationError::PostCreation {
                    account_id,
                    step,
                    source,
                }
            }
        };

        let update = ProfileUpdate::display_name(info.username());
        self.identity
            .update_profile(&account, &update)
            .await
            .map_err(fail(RegistrationStep::SetDisplayName, &account.id))?;
        account.apply(&update);
        self.session.apply_update(&update).await;

        let profile = UserProfileDocument {
            user_id: account.id.clone(),
            user_name: info.username().to_string(),
            email: info.email().to_string(),
        };
        write_document(self.documents.as_ref(), &account.id, &profile)
            .await
            .map_err(fail(RegistrationStep::WriteUserProfile, &account.id))?;

        write_document(self.documents.as_ref(), &account.id, &ChatHistoryDocument::default())
            .await
            .map_err(fail(RegistrationStep::WriteChatHistory, &account.id))?;

        info!(account_id = %account.id, "Account registered");
        Ok(account)
    }
}
