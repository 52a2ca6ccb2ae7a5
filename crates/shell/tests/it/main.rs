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

use std::sync::Arc;

use async_trait::async_trait;
use rand::SeedableRng;
use rp_data_model::{MockClock, RuntimeConfig, UserAttributes, UserHandle};
use rp_shell::{AuthClient, ClientError, Shell, SignInRequest, SignOutRequest};
use tokio::sync::{mpsc, Notify};

mod descriptor;
mod flow;
mod stale;

const ORIGIN: &str = "http://localhost:5173";
const DEPLOYED_ORIGIN: &str = "https://main.d25d1r2idtfra3.amplifyapp.com/";
const PROVIDER: &str = "AmplifyGen2OIDC";
const APP_CLIENT_ID: &str = "4example1client2id";
const HOSTED_DOMAIN: &str = "amplifygen4.auth.us-west-2.amazoncognito.com";

fn runtime_config() -> RuntimeConfig {
    RuntimeConfig::from_json(&format!(
        r#"{{
            "version": "1",
            "auth": {{
                "environment": "sandbox",
                "region": "us-west-2",
                "hosted_domain": "{HOSTED_DOMAIN}",
                "app_client_id": "{APP_CLIENT_ID}",
                "identity_providers": ["{PROVIDER}"],
                "scopes": ["openid", "aws.cognito.signin.user.admin", "email", "profile", "phone"],
                "redirect_sign_in": ["{ORIGIN}", "{DEPLOYED_ORIGIN}"],
                "redirect_sign_out": ["{ORIGIN}", "{DEPLOYED_ORIGIN}"],
                "response_type": "code",
                "user_attributes": ["email"],
                "login_with_email": true
            }}
        }}"#
    ))
    .unwrap()
}

fn user(name: &str) -> UserHandle {
    UserHandle {
        subject: format!("{name}-subject"),
        username: format!("{PROVIDER}_{name}"),
    }
}

fn email_of(user: &UserHandle) -> String {
    let name = user.subject.trim_end_matches("-subject");
    format!("{name}@example.com")
}

/// What the mock client was asked to do
#[derive(Debug)]
enum Recorded {
    Configured,
    SignIn(SignInRequest),
    SignOut(SignOutRequest),
    Fetch(UserHandle),
}

/// An auth client recording every call
struct MockClient {
    recorder: mpsc::UnboundedSender<Recorded>,
    /// When set, attribute fetches wait for a notification
    gate: Option<Arc<Notify>>,
    /// When set, attribute fetches fail with this message
    fetch_failure: Option<String>,
    /// When set, redirects can't be started
    redirect_failure: Option<String>,
}

impl MockClient {
    fn new() -> (Self, mpsc::UnboundedReceiver<Recorded>) {
        let (recorder, recorded) = mpsc::unbounded_channel();
        let client = Self {
            recorder,
            gate: None,
            fetch_failure: None,
            redirect_failure: None,
        };
        (client, recorded)
    }

    fn record(&self, recorded: Recorded) {
        // The test may not care about the recording
        let _ = self.recorder.send(recorded);
    }

    fn redirect_result(&self) -> Result<(), ClientError> {
        match &self.redirect_failure {
            Some(message) => Err(ClientError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AuthClient for MockClient {
    async fn configure(&self, _config: &RuntimeConfig) -> Result<(), ClientError> {
        self.record(Recorded::Configured);
        Ok(())
    }

    async fn sign_in_with_redirect(&self, request: SignInRequest) -> Result<(), ClientError> {
        self.record(Recorded::SignIn(request));
        self.redirect_result()
    }

    async fn sign_out(&self, request: SignOutRequest) -> Result<(), ClientError> {
        self.record(Recorded::SignOut(request));
        self.redirect_result()
    }

    async fn fetch_user_attributes(
        &self,
        user: &UserHandle,
    ) -> Result<UserAttributes, ClientError> {
        self.record(Recorded::Fetch(user.clone()));

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        if let Some(message) = &self.fetch_failure {
            return Err(ClientError::Rejected(message.clone()));
        }

        Ok([
            ("email", email_of(user)),
            ("phone_number", "+15555550100".to_owned()),
        ]
        .into_iter()
        .collect())
    }
}

fn shell_at(client: MockClient, origin: &str) -> Shell<MockClient> {
    let rng = rand_chacha::ChaChaRng::seed_from_u64(42);
    Shell::new(Arc::new(client), origin, MockClock::default(), rng)
}

fn shell(client: MockClient) -> Shell<MockClient> {
    shell_at(client, ORIGIN)
}

/// Create a shell served from `origin`, and initialize it
async fn init_test_with(
    client: MockClient,
    origin: &str,
    config: RuntimeConfig,
) -> Shell<MockClient> {
    let mut shell = shell_at(client, origin);
    shell.initialize(config).await.unwrap();
    shell
}

async fn init_test(client: MockClient) -> Shell<MockClient> {
    init_test_with(client, ORIGIN, runtime_config()).await
}
