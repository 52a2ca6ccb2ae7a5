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

use rp_data_model::RedirectIntent;

const HEADING: &str = "Amplify (Gen 2) 🤝 Midway";

/// What the shell currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// Nobody is signed in. One sign-in button per provider.
    SignedOut {
        /// The configured identity providers
        providers: Vec<String>,
    },

    /// The browser is away at the hosted UI
    Redirecting {
        /// Why it was sent there
        intent: RedirectIntent,
    },

    /// Signed in, the attributes are being fetched
    LoadingProfile,

    /// Signed in, with the attributes fetched
    SignedIn {
        /// The email address of the user
        email: String,
    },

    /// Signed in, but the attributes could not be fetched
    ProfileUnavailable,
}

impl Default for View {
    fn default() -> Self {
        Self::SignedOut {
            providers: Vec::new(),
        }
    }
}

impl View {
    /// The lines a terminal front-end prints. Buttons are in brackets.
    #[must_use]
    pub fn render(&self) -> Vec<String> {
        match self {
            Self::SignedOut { providers } => std::iter::once(HEADING.to_owned())
                .chain(
                    providers
                        .iter()
                        .map(|provider| format!("[ Sign in with {provider} ]")),
                )
                .collect(),
            Self::Redirecting {
                intent: RedirectIntent::SignIn { provider },
            } => vec![format!("Redirecting to {provider}...")],
            Self::Redirecting {
                intent: RedirectIntent::SignOut,
            } => vec!["Signing out...".to_owned()],
            Self::LoadingProfile => vec!["Loading profile...".to_owned()],
            Self::SignedIn { email } => vec![format!("Hello {email}"), "[ Sign out ]".to_owned()],
            Self::ProfileUnavailable => vec![
                "Your profile could not be loaded.".to_owned(),
                "[ Sign out ]".to_owned(),
            ],
        }
    }

    /// Whether the view offers a way to sign out
    #[must_use]
    pub fn offers_sign_out(&self) -> bool {
        matches!(self, Self::SignedIn { .. } | Self::ProfileUnavailable)
    }
}
