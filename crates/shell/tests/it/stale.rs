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

//! Attribute fetches racing with session transitions.

use std::sync::Arc;

use assert_matches::assert_matches;
use rp_shell::{AuthEvent, CallbackOutcome, View};
use tokio::sync::Notify;

use crate::{init_test, user, MockClient, Recorded, PROVIDER};

#[tokio::test]
async fn fetch_outstanding_across_sign_out_is_discarded() {
    let gate = Arc::new(Notify::new());
    let (mut client, mut recorded) = MockClient::new();
    client.gate = Some(Arc::clone(&gate));
    let mut shell = init_test(client).await;

    let correlation = shell.begin_sign_in(PROVIDER).await.unwrap();
    shell.handle_event(AuthEvent::Callback {
        correlation,
        outcome: CallbackOutcome::SignedIn(user("alice")),
    });

    // Wait for the fetch to be in flight
    loop {
        if let Some(Recorded::Fetch(_)) = recorded.recv().await {
            break;
        }
    }

    // Sign out while it is stuck
    let correlation = shell.sign_out().await.unwrap();
    shell.handle_event(AuthEvent::Callback {
        correlation,
        outcome: CallbackOutcome::SignedOut,
    });
    assert!(shell.state().is_unauthenticated());

    // Let it complete: the result must not be committed
    gate.notify_one();
    assert_eq!(shell.next_fetch_result().await, Some(false));
    assert_eq!(shell.next_fetch_result().await, None);

    assert!(shell.state().is_unauthenticated());
    assert_eq!(shell.attributes(), None);
    assert_eq!(
        shell.view(),
        View::SignedOut {
            providers: vec![PROVIDER.to_owned()]
        }
    );
}

#[tokio::test]
async fn attributes_of_an_expired_session_are_not_shown() {
    let gate = Arc::new(Notify::new());
    let (mut client, mut recorded) = MockClient::new();
    client.gate = Some(Arc::clone(&gate));
    let mut shell = init_test(client).await;
    assert_matches!(recorded.recv().await, Some(Recorded::Configured));

    // Alice's session expires while her attributes are being fetched, then
    // Bob's session is restored
    shell.handle_event(AuthEvent::SessionRestored {
        user: user("alice"),
    });
    assert_matches!(recorded.recv().await, Some(Recorded::Fetch(u)) if u == user("alice"));
    shell.handle_event(AuthEvent::SessionExpired);
    shell.handle_event(AuthEvent::SessionRestored { user: user("bob") });
    assert_matches!(recorded.recv().await, Some(Recorded::Fetch(u)) if u == user("bob"));
    assert_eq!(shell.view(), View::LoadingProfile);

    // Release both fetches, in whatever order they complete
    gate.notify_one();
    gate.notify_one();
    let first = shell.next_fetch_result().await.unwrap();
    let second = shell.next_fetch_result().await.unwrap();

    // Exactly one of them belongs to the current session
    assert!(first ^ second);
    assert_eq!(shell.next_fetch_result().await, None);
    assert_eq!(shell.state().user(), Some(&user("bob")));
    assert_eq!(
        shell.view(),
        View::SignedIn {
            email: "bob@example.com".to_owned()
        }
    );
}
