//! Registration flow tests against the in-memory backend.

mod helpers;

use std::sync::Arc;

use helpers::{test_client, valid_candidate, Call, FakeBackend, NEW_ACCOUNT_ID};
use natter_client::{RegistrationError, RegistrationStep, SignUpPhase};
use natter_common::{message_for_code, ProfileUpdate, Route, SignUpField};
use serde_json::json;

#[tokio::test]
async fn registration_runs_steps_in_order() {
    let backend = FakeBackend::new();
    let client = test_client(&backend);
    let flow = client.sign_up_flow();

    let account = flow.submit(valid_candidate()).await.unwrap();

    assert_eq!(account.id.as_str(), NEW_ACCOUNT_ID);
    assert_eq!(account.display_name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(
        backend.calls(),
        vec![
            Call::CreateAccount {
                email: "ada@example.com".into()
            },
            Call::UpdateProfile {
                account_id: NEW_ACCOUNT_ID.into(),
                update: ProfileUpdate::display_name("Ada Lovelace"),
            },
            Call::WriteDocument {
                collection: "users".into(),
                key: NEW_ACCOUNT_ID.into(),
                record: json!({
                    "userId": NEW_ACCOUNT_ID,
                    "userName": "Ada Lovelace",
                    "email": "ada@example.com",
                }),
            },
            Call::WriteDocument {
                collection: "chatHistory".into(),
                key: NEW_ACCOUNT_ID.into(),
                record: json!({}),
            },
        ]
    );

    let state = flow.state();
    assert_eq!(state.phase, SignUpPhase::Succeeded);
    assert_eq!(state.redirect, Some(Route::Home));
    assert!(state.auth_error.is_none());
    assert!(state.field_errors.is_empty());
}

#[tokio::test]
async fn registration_signs_in_new_account() {
    let backend = FakeBackend::new();
    let client = test_client(&backend);

    client.sign_up_flow().submit(valid_candidate()).await.unwrap();

    let header = client.session().profile_header().await;
    assert_eq!(header.name, "Ada Lovelace");
    assert_eq!(header.avatar.initials, "AL");
    assert!(header.photo_url.is_none());
}

#[tokio::test]
async fn invalid_form_makes_no_remote_calls() {
    let backend = FakeBackend::new();
    let client = test_client(&backend);
    let flow = client.sign_up_flow();

    let mut candidate = valid_candidate();
    candidate.email = "not-an-email".into();
    candidate.password_verification = "something-else1".into();

    let err = flow.submit(candidate).await.unwrap_err();
    let RegistrationError::Invalid(errors) = err else {
        panic!("expected validation failure, got {err:?}");
    };
    assert!(errors.contains(SignUpField::Email));
    assert_eq!(
        errors.get(SignUpField::PasswordVerification),
        Some("Passwords do not match")
    );

    assert!(backend.calls().is_empty());
    assert!(!client.session().is_signed_in().await);

    let state = flow.state();
    assert_eq!(state.phase, SignUpPhase::Idle);
    assert_eq!(state.field_errors, errors);
}

#[tokio::test]
async fn duplicate_email_fails_without_writes() {
    let backend = FakeBackend::new();
    backend.fail_create_account("auth/email-already-in-use");
    let client = test_client(&backend);
    let flow = client.sign_up_flow();

    let err = flow.submit(valid_candidate()).await.unwrap_err();
    assert!(matches!(err, RegistrationError::AccountCreation(ref e) if e.code == "auth/email-already-in-use"));

    assert_eq!(backend.calls().len(), 1);
    assert!(backend.documents().is_empty());
    assert!(!client.session().is_signed_in().await);

    let state = flow.state();
    assert_eq!(state.phase, SignUpPhase::Failed);
    assert_eq!(
        state.auth_error.as_deref(),
        Some(message_for_code("auth/email-already-in-use"))
    );
    assert!(state.redirect.is_none());
}

#[tokio::test]
async fn failed_profile_write_leaves_account_in_place() {
    let backend = FakeBackend::new();
    backend.fail_write("users", "permission-denied");
    let client = test_client(&backend);
    let flow = client.sign_up_flow();

    let err = flow.submit(valid_candidate()).await.unwrap_err();
    match &err {
        RegistrationError::PostCreation {
            account_id,
            step,
            source,
        } => {
            assert_eq!(account_id.as_str(), NEW_ACCOUNT_ID);
            assert_eq!(*step, RegistrationStep::WriteUserProfile);
            assert_eq!(source.code, "permission-denied");
        }
        other => panic!("expected post-creation failure, got {other:?}"),
    }

    // No retry and no chat history write after the failure.
    let documents = backend.documents();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].0, "users");

    let account = client.session().current_account().await.unwrap();
    assert_eq!(account.id.as_str(), NEW_ACCOUNT_ID);
    assert_eq!(account.display_name.as_deref(), Some("Ada Lovelace"));

    let state = flow.state();
    assert_eq!(state.phase, SignUpPhase::Failed);
    assert_eq!(
        state.auth_error.as_deref(),
        Some(message_for_code("permission-denied"))
    );
}

#[tokio::test]
async fn failed_chat_history_write_names_the_step() {
    let backend = FakeBackend::new();
    backend.fail_write("chatHistory", "unavailable");
    let client = test_client(&backend);

    let err = client
        .sign_up_flow()
        .submit(valid_candidate())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RegistrationError::PostCreation {
            step: RegistrationStep::WriteChatHistory,
            ..
        }
    ));
    assert_eq!(backend.documents().len(), 2);
}

#[tokio::test]
async fn failed_display_name_stops_before_documents() {
    let backend = FakeBackend::new();
    backend.fail_update_profile("auth/internal-error");
    let client = test_client(&backend);

    let err = client
        .sign_up_flow()
        .submit(valid_candidate())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RegistrationError::PostCreation {
            step: RegistrationStep::SetDisplayName,
            ..
        }
    ));
    assert!(backend.documents().is_empty());
    let account = client.session().current_account().await.unwrap();
    assert!(account.display_name.is_none());
}

#[tokio::test]
async fn second_submit_while_running_is_refused() {
    let backend = FakeBackend::new();
    let gate = backend.hold_create_account();
    let client = test_client(&backend);
    let flow = Arc::new(client.sign_up_flow());

    let mut state = flow.subscribe();
    let running = tokio::spawn({
        let flow = Arc::clone(&flow);
        async move { flow.submit(valid_candidate()).await }
    });
    state.wait_for(|s| s.is_busy()).await.unwrap();

    let err = flow.submit(valid_candidate()).await.unwrap_err();
    assert!(matches!(err, RegistrationError::InProgress));

    gate.notify_one();
    running.await.unwrap().unwrap();

    let creates = backend
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::CreateAccount { .. }))
        .count();
    assert_eq!(creates, 1);
    assert_eq!(flow.state().phase, SignUpPhase::Succeeded);
}

#[tokio::test]
async fn invalid_submit_while_running_leaves_running_state_alone() {
    let backend = FakeBackend::new();
    let gate = backend.hold_create_account();
    let client = test_client(&backend);
    let flow = Arc::new(client.sign_up_flow());

    let mut state = flow.subscribe();
    let running = tokio::spawn({
        let flow = Arc::clone(&flow);
        async move { flow.submit(valid_candidate()).await }
    });
    state.wait_for(|s| s.is_busy()).await.unwrap();

    let mut invalid = valid_candidate();
    invalid.email = "nope".into();
    let err = flow.submit(invalid).await.unwrap_err();
    assert!(matches!(err, RegistrationError::InProgress));
    assert!(flow.state().field_errors.is_empty());

    gate.notify_one();
    running.await.unwrap().unwrap();

    let state = flow.state();
    assert_eq!(state.phase, SignUpPhase::Succeeded);
    assert!(state.field_errors.is_empty());
}
