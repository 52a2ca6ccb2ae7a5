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

use rand::RngCore;
use rp_data_model::{
    Clock, CorrelationToken, InvalidTransitionError, RuntimeConfig, SessionState,
    UserAttributes, EMAIL_ATTRIBUTE,
};
use tokio::sync::{mpsc, watch};
use tracing::{info_span, Instrument};
use ulid::Ulid;

use crate::{
    error::{ClientError, ShellError},
    requests::{build_sign_in_request, build_sign_out_request},
    AuthClient, AuthEvent, CallbackOutcome, View,
};

/// The attributes the shell reads. Each of them must be mapped from the
/// provider.
pub const ATTRIBUTES_READ: &[&str] = &[EMAIL_ATTRIBUTE];

/// The two things a user can do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// Press a "Sign in with" button
    SignIn {
        /// The provider of that button
        provider: String,
    },

    /// Press the "Sign out" button
    SignOut,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum Profile {
    #[default]
    None,
    Loading,
    Loaded(UserAttributes),
    Unavailable,
}

struct FetchResult {
    session_id: Ulid,
    result: Result<UserAttributes, ClientError>,
}

/// The relying-party shell.
///
/// It keeps the last known session state reported by the auth client, drives
/// the two redirect round trips, and fetches the user attributes once per
/// authenticated session.
pub struct Shell<C> {
    client: Arc<C>,
    origin: String,
    clock: Box<dyn Clock>,
    rng: Box<dyn RngCore + Send>,
    config: Option<RuntimeConfig>,
    state: SessionState,
    profile: Profile,
    view: watch::Sender<View>,
    fetch_tx: mpsc::Sender<FetchResult>,
    fetch_rx: mpsc::Receiver<FetchResult>,
    fetches_outstanding: usize,
}

impl<C: AuthClient + 'static> Shell<C> {
    /// Create a shell served from `origin`, talking to `client`
    pub fn new(
        client: Arc<C>,
        origin: impl Into<String>,
        clock: impl Clock + 'static,
        rng: impl RngCore + Send + 'static,
    ) -> Self {
        let (fetch_tx, fetch_rx) = mpsc::channel(8);
        let (view, _) = watch::channel(View::default());

        Self {
            client,
            origin: origin.into(),
            clock: Box::new(clock),
            rng: Box::new(rng),
            config: None,
            state: SessionState::default(),
            profile: Profile::None,
            view,
            fetch_tx,
            fetch_rx,
            fetches_outstanding: 0,
        }
    }

    /// The last known session state
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The attributes of the signed in user, once fetched
    #[must_use]
    pub fn attributes(&self) -> Option<&UserAttributes> {
        match &self.profile {
            Profile::Loaded(attributes) => Some(attributes),
            Profile::None | Profile::Loading | Profile::Unavailable => None,
        }
    }

    /// What the shell currently shows
    #[must_use]
    pub fn view(&self) -> View {
        self.view.borrow().clone()
    }

    /// Watch the rendered view
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<View> {
        self.view.subscribe()
    }

    fn compute_view(&self) -> View {
        match &self.state {
            SessionState::Unauthenticated => View::SignedOut {
                providers: self
                    .config
                    .as_ref()
                    .map(|config| config.auth.identity_providers.clone())
                    .unwrap_or_default(),
            },
            SessionState::PendingRedirect { intent, .. } => View::Redirecting {
                intent: intent.clone(),
            },
            SessionState::Authenticated { .. } => match &self.profile {
                Profile::None | Profile::Loading => View::LoadingProfile,
                Profile::Loaded(attributes) => match attributes.email() {
                    Some(email) => View::SignedIn {
                        email: email.to_owned(),
                    },
                    None => View::ProfileUnavailable,
                },
                Profile::Unavailable => View::ProfileUnavailable,
            },
        }
    }

    fn publish(&self) {
        let view = self.compute_view();
        self.view.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }

    /// Configure the auth client. Must happen once, before anything else.
    ///
    /// Initializing again with the same configuration does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell was initialized with a different
    /// configuration, if the configuration does not map an attribute the
    /// shell reads, or if the client refuses it
    #[tracing::instrument(
        name = "shell.initialize",
        skip_all,
        fields(environment = %config.auth.environment),
        err,
    )]
    pub async fn initialize(&mut self, config: RuntimeConfig) -> Result<(), ShellError> {
        if let Some(current) = &self.config {
            if *current == config {
                tracing::debug!("Auth client already configured");
                return Ok(());
            }

            return Err(ShellError::AlreadyInitialized);
        }

        config.auth.hosted_ui_base()?;

        if config.auth.app_client_id.is_none() {
            return Err(ShellError::MissingAppClientId);
        }

        if let Some(attribute) = ATTRIBUTES_READ
            .iter()
            .find(|attribute| !config.auth.maps_attribute(attribute))
        {
            return Err(ShellError::UnmappedAttribute((*attribute).to_owned()));
        }

        self.client.configure(&config).await?;

        tracing::info!(
            hosted_domain = %config.auth.hosted_domain,
            "Auth client configured"
        );

        self.config = Some(config);
        self.publish();

        Ok(())
    }

    /// Start a redirect-based login through the given provider.
    ///
    /// The outcome arrives later, as a callback event carrying the returned
    /// correlation token.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell is not initialized, a session exists or
    /// a redirect is already pending, or the client could not start the
    /// redirect
    #[tracing::instrument(name = "shell.begin_sign_in", skip(self), err)]
    pub async fn begin_sign_in(&mut self, provider: &str) -> Result<CorrelationToken, ShellError> {
        let config = self.config.as_ref().ok_or(ShellError::NotInitialized)?;
        if !self.state.is_unauthenticated() {
            return Err(InvalidTransitionError.into());
        }

        let now = self.clock.now();
        let correlation = CorrelationToken::generate(now, &mut *self.rng);
        let request = build_sign_in_request(
            &config.auth,
            provider,
            &self.origin,
            correlation,
            &mut *self.rng,
        )?;

        self.state = self
            .state
            .clone()
            .begin_sign_in(correlation, provider.to_owned(), now)?;
        self.profile = Profile::None;
        self.publish();

        tracing::info!(%correlation, url = %request.url, "Redirecting to the hosted UI");

        if let Err(error) = self.client.sign_in_with_redirect(request).await {
            // Nothing left the browser, so no callback will ever come
            self.state = SessionState::Unauthenticated;
            self.publish();
            return Err(error.into());
        }

        Ok(correlation)
    }

    /// Start the termination of the current session.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell is not initialized, there is no session,
    /// or the client could not start the redirect
    #[tracing::instrument(name = "shell.sign_out", skip_all, err)]
    pub async fn sign_out(&mut self) -> Result<CorrelationToken, ShellError> {
        let config = self.config.as_ref().ok_or(ShellError::NotInitialized)?;
        if !self.state.is_authenticated() {
            return Err(InvalidTransitionError.into());
        }

        let now = self.clock.now();
        let correlation = CorrelationToken::generate(now, &mut *self.rng);
        let request = build_sign_out_request(&config.auth, &self.origin, correlation)?;

        let previous_state = self.state.clone();
        let previous_profile = std::mem::take(&mut self.profile);
        self.state = self.state.clone().begin_sign_out(correlation, now)?;
        self.publish();

        tracing::info!(%correlation, url = %request.url, "Signing out at the hosted UI");

        if let Err(error) = self.client.sign_out(request).await {
            self.state = previous_state;
            self.profile = previous_profile;
            self.publish();
            return Err(error.into());
        }

        Ok(correlation)
    }

    /// Perform a user action
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying operation
    pub async fn perform(&mut self, action: UserAction) -> Result<(), ShellError> {
        match action {
            UserAction::SignIn { provider } => self.begin_sign_in(&provider).await?,
            UserAction::SignOut => self.sign_out().await?,
        };

        Ok(())
    }

    /// Apply an event from the auth client.
    ///
    /// Events which don't apply to the current state, like a callback for a
    /// request which is no longer pending, are logged and ignored.
    pub fn handle_event(&mut self, event: AuthEvent) {
        match event {
            AuthEvent::Callback {
                correlation,
                outcome,
            } => self.handle_callback(correlation, outcome),

            AuthEvent::SessionRestored { user } => {
                let now = self.clock.now();
                let session_id = Ulid::from_datetime_with_source(now.into(), &mut *self.rng);
                match self.state.clone().restore(session_id, user, now) {
                    Ok(state) => {
                        tracing::info!(%session_id, "Session restored");
                        self.state = state;
                        self.start_fetch();
                    }
                    Err(_) => {
                        tracing::warn!("Ignoring restored session, a session is already known");
                    }
                }
            }

            AuthEvent::SessionExpired => {
                tracing::info!("Session expired");
                self.state = self.state.clone().expire();
                self.profile = Profile::None;
            }
        }

        self.publish();
    }

    fn handle_callback(&mut self, correlation: CorrelationToken, outcome: CallbackOutcome) {
        if self.state.pending_correlation() != Some(&correlation) {
            tracing::warn!(
                %correlation,
                "Ignoring callback for a request which is not pending"
            );
            return;
        }

        match outcome {
            CallbackOutcome::SignedIn(user) => {
                let now = self.clock.now();
                let session_id = Ulid::from_datetime_with_source(now.into(), &mut *self.rng);
                let signed_in = self
                    .state
                    .clone()
                    .complete_sign_in(&correlation, session_id, user, now);

                match signed_in {
                    Ok(state) => {
                        tracing::info!(%correlation, %session_id, "Signed in");
                        self.state = state;
                        self.start_fetch();
                    }
                    Err(_) => {
                        tracing::warn!(%correlation, "Ignoring sign-in callback for a logout");
                    }
                }
            }

            CallbackOutcome::SignedOut => {
                if let Ok(state) = self.state.clone().end_redirect(&correlation) {
                    tracing::info!(%correlation, "Signed out");
                    self.state = state;
                    self.profile = Profile::None;
                }
            }

            CallbackOutcome::Failed(reason) => {
                if let Ok(state) = self.state.clone().end_redirect(&correlation) {
                    tracing::warn!(%correlation, %reason, "Redirect failed");
                    self.state = state;
                    self.profile = Profile::None;
                }
            }
        }
    }

    fn start_fetch(&mut self) {
        let (Some(session_id), Some(user)) = (self.state.session_id(), self.state.user().cloned())
        else {
            return;
        };

        self.profile = Profile::Loading;
        self.fetches_outstanding += 1;

        let client = Arc::clone(&self.client);
        let sender = self.fetch_tx.clone();
        let span = info_span!("shell.fetch_attributes", %session_id, user.subject = %user.subject);

        tokio::spawn(
            async move {
                let result = client.fetch_user_attributes(&user).await;
                // The shell is gone
                if sender.send(FetchResult { session_id, result }).await.is_err() {
                    tracing::debug!("Dropping fetched attributes, nobody is listening");
                }
            }
            .instrument(span),
        );
    }

    /// Commit a fetch result, if it still belongs to the current session.
    /// Returns whether it was committed.
    fn apply_fetch(&mut self, fetch: FetchResult) -> bool {
        self.fetches_outstanding = self.fetches_outstanding.saturating_sub(1);

        if self.state.session_id() != Some(fetch.session_id) {
            tracing::debug!(
                session_id = %fetch.session_id,
                "Discarding attributes of a previous session"
            );
            return false;
        }

        self.profile = match fetch.result {
            Ok(attributes) => Profile::Loaded(attributes.restricted_to(ATTRIBUTES_READ)),
            Err(error) => {
                tracing::warn!(
                    error = &error as &dyn std::error::Error,
                    "Could not fetch the user attributes"
                );
                Profile::Unavailable
            }
        };
        self.publish();

        true
    }

    /// Wait for the next attribute fetch to complete, and commit it if it
    /// still belongs to the current session.
    ///
    /// Returns whether it was committed, or `None` if no fetch is
    /// outstanding.
    pub async fn next_fetch_result(&mut self) -> Option<bool> {
        if self.fetches_outstanding == 0 {
            return None;
        }

        let fetch = self.fetch_rx.recv().await?;
        Some(self.apply_fetch(fetch))
    }

    /// Run the shell until the auth client stops emitting events.
    ///
    /// User actions which fail are logged, the shell keeps its state.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<AuthEvent>,
        mut actions: mpsc::Receiver<UserAction>,
    ) -> Self {
        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        tracing::debug!("Auth client closed the event channel");
                        break;
                    };
                    self.handle_event(event);
                }

                Some(action) = actions.recv() => {
                    if let Err(error) = self.perform(action).await {
                        tracing::warn!(
                            error = &error as &dyn std::error::Error,
                            "User action failed"
                        );
                    }
                }

                Some(fetch) = self.fetch_rx.recv() => {
                    self.apply_fetch(fetch);
                }
            }
        }

        self
    }
}
