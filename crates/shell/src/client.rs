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

use async_trait::async_trait;
use rp_data_model::{CorrelationToken, RuntimeConfig, UserAttributes, UserHandle};
use url::Url;

use crate::{error::ClientError, requests::authorization::AuthorizationValidationData};

/// A redirect-based login, ready to be handed to the auth client
#[derive(Debug, Clone)]
pub struct SignInRequest {
    /// Links this request to the callback completing it
    pub correlation: CorrelationToken,

    /// The external identity provider
    pub provider: String,

    /// Where the browser must be sent
    pub url: Url,

    /// What the auth client needs to validate the callback
    pub validation: AuthorizationValidationData,
}

/// A logout, ready to be handed to the auth client
#[derive(Debug, Clone)]
pub struct SignOutRequest {
    /// Links this request to the callback completing it
    pub correlation: CorrelationToken,

    /// Where the browser must be sent
    pub url: Url,

    /// Where the browser lands after the logout
    pub logout_uri: String,
}

/// How a redirect round trip ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The user is signed in
    SignedIn(UserHandle),

    /// The session was terminated
    SignedOut,

    /// The round trip failed. The reason is only logged.
    Failed(String),
}

/// State-transition events emitted by the auth client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// The browser came back from a redirect
    Callback {
        /// The token of the request this callback completes
        correlation: CorrelationToken,

        /// How it went
        outcome: CallbackOutcome,
    },

    /// A persisted session was found at startup
    SessionRestored {
        /// The user of that session
        user: UserHandle,
    },

    /// The session ended outside of the shell's control
    SessionExpired,
}

/// The external auth client. It owns the session, performs the redirects and
/// reports back through [`AuthEvent`]s.
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Configure the client from the runtime configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the client refuses the configuration
    async fn configure(&self, config: &RuntimeConfig) -> Result<(), ClientError>;

    /// Send the browser to the hosted UI to log in.
    ///
    /// # Errors
    ///
    /// Returns an error if the redirect could not be started. Protocol
    /// failures are reported later through a callback event.
    async fn sign_in_with_redirect(&self, request: SignInRequest) -> Result<(), ClientError>;

    /// Send the browser to the hosted UI to log out.
    ///
    /// # Errors
    ///
    /// Returns an error if the redirect could not be started
    async fn sign_out(&self, request: SignOutRequest) -> Result<(), ClientError>;

    /// Fetch the attributes of the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns an error if the attributes could not be fetched
    async fn fetch_user_attributes(&self, user: &UserHandle)
        -> Result<UserAttributes, ClientError>;
}

