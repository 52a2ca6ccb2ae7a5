// Copyright 2024 The rp-shell authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use assert_matches::assert_matches;
use rand::SeedableRng;
use rp_data_model::{
    Clock, CorrelationToken, InvalidTransitionError, MockClock, RedirectIntent, SessionState,
};
use rp_shell::{AuthEvent, CallbackOutcome, ShellError, UserAction, View};
use tokio::sync::mpsc;

use crate::{
    email_of, init_test, init_test_with, runtime_config, shell, user, MockClient, Recorded,
    ORIGIN, PROVIDER,
};

fn signed_out() -> View {
    View::SignedOut {
        providers: vec![PROVIDER.to_owned()],
    }
}

#[tokio::test]
async fn sign_in_then_sign_out() {
    let (client, mut recorded) = MockClient::new();
    let mut shell = init_test(client).await;
    assert_matches!(recorded.recv().await, Some(Recorded::Configured));
    assert_eq!(shell.view(), signed_out());

    // Press "Sign in with AmplifyGen2OIDC"
    let correlation = shell.begin_sign_in(PROVIDER).await.unwrap();
    let request = assert_matches!(recorded.recv().await, Some(Recorded::SignIn(r)) => r);
    assert_eq!(request.correlation, correlation);
    assert_eq!(request.provider, PROVIDER);
    assert_eq!(request.validation.redirect_uri, ORIGIN);
    assert!(shell.state().is_pending_redirect());
    assert_eq!(
        shell.view(),
        View::Redirecting {
            intent: RedirectIntent::SignIn {
                provider: PROVIDER.to_owned()
            }
        }
    );

    // The browser comes back, signed in
    let alice = user("alice");
    shell.handle_event(AuthEvent::Callback {
        correlation,
        outcome: CallbackOutcome::SignedIn(alice.clone()),
    });
    assert!(shell.state().is_authenticated());
    assert_eq!(shell.state().user(), Some(&alice));
    assert_eq!(shell.view(), View::LoadingProfile);

    // Exactly one fetch is issued
    let fetched = assert_matches!(recorded.recv().await, Some(Recorded::Fetch(u)) => u);
    assert_eq!(fetched, alice);
    assert_eq!(shell.next_fetch_result().await, Some(true));
    assert!(recorded.try_recv().is_err());

    let attributes = shell.attributes().unwrap();
    assert_eq!(attributes.email(), Some(email_of(&alice).as_str()));
    // Only what the shell reads is kept
    assert_eq!(attributes.get("phone_number"), None);
    assert_eq!(
        shell.view(),
        View::SignedIn {
            email: "alice@example.com".to_owned()
        }
    );
    assert_eq!(
        shell.view().render(),
        ["Hello alice@example.com", "[ Sign out ]"]
    );

    // Press "Sign out"
    let correlation = shell.sign_out().await.unwrap();
    let request = assert_matches!(recorded.recv().await, Some(Recorded::SignOut(r)) => r);
    assert_eq!(request.correlation, correlation);
    assert_eq!(request.logout_uri, ORIGIN);
    assert_eq!(shell.attributes(), None);
    assert_eq!(
        shell.view(),
        View::Redirecting {
            intent: RedirectIntent::SignOut
        }
    );

    shell.handle_event(AuthEvent::Callback {
        correlation,
        outcome: CallbackOutcome::SignedOut,
    });
    assert_eq!(shell.state(), &SessionState::Unauthenticated);
    assert_eq!(shell.attributes(), None);
    assert_eq!(shell.view(), signed_out());
}

#[tokio::test]
async fn run_loop() {
    let (client, mut recorded) = MockClient::new();
    let shell = init_test(client).await;
    assert_matches!(recorded.recv().await, Some(Recorded::Configured));

    let mut views = shell.subscribe();
    let (events_tx, events) = mpsc::channel(8);
    let (actions_tx, actions) = mpsc::channel(8);
    let handle = tokio::spawn(shell.run(events, actions));

    actions_tx
        .send(UserAction::SignIn {
            provider: PROVIDER.to_owned(),
        })
        .await
        .unwrap();
    let request = assert_matches!(recorded.recv().await, Some(Recorded::SignIn(r)) => r);

    events_tx
        .send(AuthEvent::Callback {
            correlation: request.correlation,
            outcome: CallbackOutcome::SignedIn(user("alice")),
        })
        .await
        .unwrap();

    views
        .wait_for(|view| *view == View::SignedIn { email: "alice@example.com".to_owned() })
        .await
        .unwrap();

    actions_tx.send(UserAction::SignOut).await.unwrap();
    // The fetch of the session comes first
    assert_matches!(recorded.recv().await, Some(Recorded::Fetch(_)));
    let request = assert_matches!(recorded.recv().await, Some(Recorded::SignOut(r)) => r);

    events_tx
        .send(AuthEvent::Callback {
            correlation: request.correlation,
            outcome: CallbackOutcome::SignedOut,
        })
        .await
        .unwrap();

    views
        .wait_for(|view| *view == signed_out())
        .await
        .unwrap();

    // Closing the event channel stops the shell
    drop(events_tx);
    let shell = handle.await.unwrap();
    assert!(shell.state().is_unauthenticated());
    assert_eq!(shell.attributes(), None);
}

#[tokio::test]
async fn failed_login_returns_to_signed_out() {
    let (client, _recorded) = MockClient::new();
    let mut shell = init_test(client).await;

    let correlation = shell.begin_sign_in(PROVIDER).await.unwrap();
    shell.handle_event(AuthEvent::Callback {
        correlation,
        outcome: CallbackOutcome::Failed("access_denied".to_owned()),
    });

    assert!(shell.state().is_unauthenticated());
    assert_eq!(shell.view(), signed_out());

    // A new attempt can be made
    shell.begin_sign_in(PROVIDER).await.unwrap();
}

#[tokio::test]
async fn unexpected_callbacks_are_ignored() {
    let (client, _recorded) = MockClient::new();
    let mut shell = init_test(client).await;

    // No redirect pending
    let mut rng = rand_chacha::ChaChaRng::seed_from_u64(1337);
    let stranger = CorrelationToken::generate(MockClock::default().now(), &mut rng);
    shell.handle_event(AuthEvent::Callback {
        correlation: stranger,
        outcome: CallbackOutcome::SignedIn(user("mallory")),
    });
    assert!(shell.state().is_unauthenticated());

    // Another redirect is pending
    let correlation = shell.begin_sign_in(PROVIDER).await.unwrap();
    assert_ne!(correlation, stranger);
    shell.handle_event(AuthEvent::Callback {
        correlation: stranger,
        outcome: CallbackOutcome::SignedIn(user("mallory")),
    });
    assert_eq!(shell.state().pending_correlation(), Some(&correlation));

    // A login callback can't complete a logout
    shell.handle_event(AuthEvent::Callback {
        correlation,
        outcome: CallbackOutcome::SignedIn(user("alice")),
    });
    let correlation = shell.sign_out().await.unwrap();
    shell.handle_event(AuthEvent::Callback {
        correlation,
        outcome: CallbackOutcome::SignedIn(user("mallory")),
    });
    assert_eq!(shell.state().intent(), Some(&RedirectIntent::SignOut));
}

#[tokio::test]
async fn invalid_user_actions() {
    let (client, _recorded) = MockClient::new();
    let mut shell = shell(client);

    assert_matches!(
        shell.begin_sign_in(PROVIDER).await,
        Err(ShellError::NotInitialized)
    );
    shell.initialize(runtime_config()).await.unwrap();

    assert_matches!(
        shell.sign_out().await,
        Err(ShellError::InvalidTransition(InvalidTransitionError))
    );
    assert_matches!(
        shell.begin_sign_in("SomeOtherIdP").await,
        Err(ShellError::UnknownProvider(name)) if name == "SomeOtherIdP"
    );

    shell.begin_sign_in(PROVIDER).await.unwrap();
    assert_matches!(
        shell.begin_sign_in(PROVIDER).await,
        Err(ShellError::InvalidTransition(_))
    );
    assert_matches!(
        shell.sign_out().await,
        Err(ShellError::InvalidTransition(_))
    );
}

#[tokio::test]
async fn initialize_once() {
    let (client, mut recorded) = MockClient::new();
    let mut shell = shell(client);

    shell.initialize(runtime_config()).await.unwrap();
    // Same configuration, nothing happens
    shell.initialize(runtime_config()).await.unwrap();
    assert_matches!(recorded.recv().await, Some(Recorded::Configured));
    assert!(recorded.try_recv().is_err());

    let mut other = runtime_config();
    other.auth.hosted_domain = "amplifygen2.auth.us-west-2.amazoncognito.com".to_owned();
    assert_matches!(
        shell.initialize(other).await,
        Err(ShellError::AlreadyInitialized)
    );
}

#[tokio::test]
async fn initialize_checks_the_configuration() {
    let (client, mut recorded) = MockClient::new();
    let mut shell = shell(client);

    let mut config = runtime_config();
    config.auth.user_attributes = vec!["phone_number".to_owned()];
    assert_matches!(
        shell.initialize(config).await,
        Err(ShellError::UnmappedAttribute(name)) if name == "email"
    );

    let mut config = runtime_config();
    config.auth.app_client_id = None;
    assert_matches!(
        shell.initialize(config).await,
        Err(ShellError::MissingAppClientId)
    );

    // The client was never configured
    assert!(recorded.try_recv().is_err());
}

#[tokio::test]
async fn unavailable_profile() {
    let (mut client, _recorded) = MockClient::new();
    client.fetch_failure = Some("throttled".to_owned());
    let mut shell = init_test(client).await;

    let correlation = shell.begin_sign_in(PROVIDER).await.unwrap();
    shell.handle_event(AuthEvent::Callback {
        correlation,
        outcome: CallbackOutcome::SignedIn(user("alice")),
    });

    assert_eq!(shell.next_fetch_result().await, Some(true));
    assert!(shell.state().is_authenticated());
    assert_eq!(shell.attributes(), None);
    assert_eq!(shell.view(), View::ProfileUnavailable);
    assert!(shell.view().offers_sign_out());

    // No retry, but signing out still works
    shell.sign_out().await.unwrap();
}

#[tokio::test]
async fn redirect_which_could_not_start() {
    let (mut client, _recorded) = MockClient::new();
    client.redirect_failure = Some("popup blocked".to_owned());
    let mut shell = init_test(client).await;

    assert_matches!(
        shell.begin_sign_in(PROVIDER).await,
        Err(ShellError::Client(_))
    );
    assert!(shell.state().is_unauthenticated());
    assert_eq!(shell.view(), signed_out());
}

#[tokio::test]
async fn restored_then_expired_session() {
    let (client, mut recorded) = MockClient::new();
    let mut shell = init_test(client).await;
    assert_matches!(recorded.recv().await, Some(Recorded::Configured));

    let bob = user("bob");
    shell.handle_event(AuthEvent::SessionRestored { user: bob.clone() });
    assert!(shell.state().is_authenticated());
    assert_matches!(recorded.recv().await, Some(Recorded::Fetch(u)) if u == bob);
    assert_eq!(shell.next_fetch_result().await, Some(true));
    assert_eq!(
        shell.view(),
        View::SignedIn {
            email: "bob@example.com".to_owned()
        }
    );

    // Can't restore over an existing session
    let session_id = shell.state().session_id();
    shell.handle_event(AuthEvent::SessionRestored { user: user("mallory") });
    assert_eq!(shell.state().session_id(), session_id);
    assert_eq!(shell.state().user(), Some(&bob));

    shell.handle_event(AuthEvent::SessionExpired);
    assert!(shell.state().is_unauthenticated());
    assert_eq!(shell.attributes(), None);
    assert_eq!(shell.view(), signed_out());
}

#[tokio::test]
async fn late_callback_of_a_discarded_request_is_ignored() {
    let (client, mut recorded) = MockClient::new();
    let mut shell = init_test(client).await;
    assert_matches!(recorded.recv().await, Some(Recorded::Configured));

    // The session is cleared while the browser is away
    let correlation = shell.begin_sign_in(PROVIDER).await.unwrap();
    assert_matches!(recorded.recv().await, Some(Recorded::SignIn(_)));
    shell.handle_event(AuthEvent::SessionExpired);
    assert!(shell.state().is_unauthenticated());

    // The browser comes back afterwards
    shell.handle_event(AuthEvent::Callback {
        correlation,
        outcome: CallbackOutcome::SignedIn(user("alice")),
    });
    assert!(shell.state().is_unauthenticated());
    assert_eq!(shell.view(), signed_out());
    assert_eq!(shell.next_fetch_result().await, None);

    // A fresh attempt does not revive the old token either
    let fresh = shell.begin_sign_in(PROVIDER).await.unwrap();
    assert_ne!(fresh, correlation);
    shell.handle_event(AuthEvent::Callback {
        correlation,
        outcome: CallbackOutcome::SignedIn(user("alice")),
    });
    assert_eq!(shell.state().pending_correlation(), Some(&fresh));

    // No attribute fetch was ever issued
    assert_matches!(recorded.recv().await, Some(Recorded::SignIn(_)));
    assert!(recorded.try_recv().is_err());
}

#[tokio::test]
async fn late_callback_of_a_redirect_which_could_not_start_is_ignored() {
    let (mut client, mut recorded) = MockClient::new();
    client.redirect_failure = Some("popup blocked".to_owned());
    let mut shell = init_test(client).await;
    assert_matches!(recorded.recv().await, Some(Recorded::Configured));

    assert_matches!(
        shell.begin_sign_in(PROVIDER).await,
        Err(ShellError::Client(_))
    );
    let request = assert_matches!(recorded.recv().await, Some(Recorded::SignIn(r)) => r);

    shell.handle_event(AuthEvent::Callback {
        correlation: request.correlation,
        outcome: CallbackOutcome::SignedIn(user("alice")),
    });
    assert!(shell.state().is_unauthenticated());
    assert_eq!(shell.attributes(), None);
    assert!(recorded.try_recv().is_err());
}

#[tokio::test]
async fn sign_in_from_an_unlisted_origin() {
    let (client, mut recorded) = MockClient::new();
    let mut shell = init_test_with(client, "http://localhost:3000", runtime_config()).await;
    assert_matches!(recorded.recv().await, Some(Recorded::Configured));

    assert_matches!(
        shell.begin_sign_in(PROVIDER).await,
        Err(ShellError::OriginNotAllowed { origin, kind: "sign-in" })
            if origin == "http://localhost:3000"
    );

    // Nothing was handed to the client
    assert!(recorded.try_recv().is_err());
    assert!(shell.state().is_unauthenticated());
    assert_eq!(shell.view(), signed_out());
}

#[tokio::test]
async fn no_fetch_outstanding() {
    let (client, _recorded) = MockClient::new();
    let mut shell = init_test(client).await;

    assert_eq!(shell.next_fetch_result().await, None);
}
