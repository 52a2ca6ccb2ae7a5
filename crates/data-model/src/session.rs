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

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::{InvalidTransitionError, UserHandle};

/// Opaque value linking a redirect request to the callback completing it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(Ulid);

impl CorrelationToken {
    /// Generate a new token
    pub fn generate<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> Self {
        Self(Ulid::from_datetime_with_source(now.into(), rng))
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Why the browser was sent away
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum RedirectIntent {
    /// Login through the named external provider
    SignIn { provider: String },

    /// Termination of the current session
    SignOut,
}

/// The last known state of the authentication session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Unauthenticated,
    PendingRedirect {
        correlation: CorrelationToken,
        intent: RedirectIntent,
        started_at: DateTime<Utc>,
    },
    Authenticated {
        session_id: Ulid,
        user: UserHandle,
        authenticated_at: DateTime<Utc>,
    },
}

impl SessionState {
    /// Start a redirect-based login
    ///
    /// # Errors
    ///
    /// Returns an error if the session is not unauthenticated
    pub fn begin_sign_in(
        self,
        correlation: CorrelationToken,
        provider: String,
        started_at: DateTime<Utc>,
    ) -> Result<Self, InvalidTransitionError> {
        match self {
            Self::Unauthenticated => Ok(Self::PendingRedirect {
                correlation,
                intent: RedirectIntent::SignIn { provider },
                started_at,
            }),
            Self::PendingRedirect { .. } | Self::Authenticated { .. } => {
                Err(InvalidTransitionError)
            }
        }
    }

    /// Start the termination of the current session
    ///
    /// # Errors
    ///
    /// Returns an error if the session is not authenticated
    pub fn begin_sign_out(
        self,
        correlation: CorrelationToken,
        started_at: DateTime<Utc>,
    ) -> Result<Self, InvalidTransitionError> {
        match self {
            Self::Authenticated { .. } => Ok(Self::PendingRedirect {
                correlation,
                intent: RedirectIntent::SignOut,
                started_at,
            }),
            Self::Unauthenticated | Self::PendingRedirect { .. } => Err(InvalidTransitionError),
        }
    }

    /// The provider redirected back after a successful login
    ///
    /// # Errors
    ///
    /// Returns an error if no login with this correlation token is pending
    pub fn complete_sign_in(
        self,
        correlation: &CorrelationToken,
        session_id: Ulid,
        user: UserHandle,
        authenticated_at: DateTime<Utc>,
    ) -> Result<Self, InvalidTransitionError> {
        match self {
            Self::PendingRedirect {
                correlation: pending,
                intent: RedirectIntent::SignIn { .. },
                ..
            } if pending == *correlation => Ok(Self::Authenticated {
                session_id,
                user,
                authenticated_at,
            }),
            _ => Err(InvalidTransitionError),
        }
    }

    /// The redirect round trip ended: either the logout went through, or the
    /// login failed. Both land on [`SessionState::Unauthenticated`].
    ///
    /// # Errors
    ///
    /// Returns an error if no redirect with this correlation token is pending
    pub fn end_redirect(
        self,
        correlation: &CorrelationToken,
    ) -> Result<Self, InvalidTransitionError> {
        match self {
            Self::PendingRedirect {
                correlation: pending,
                ..
            } if pending == *correlation => Ok(Self::Unauthenticated),
            _ => Err(InvalidTransitionError),
        }
    }

    /// The auth client found a persisted session
    ///
    /// # Errors
    ///
    /// Returns an error if the session is not unauthenticated
    pub fn restore(
        self,
        session_id: Ulid,
        user: UserHandle,
        authenticated_at: DateTime<Utc>,
    ) -> Result<Self, InvalidTransitionError> {
        match self {
            Self::Unauthenticated => Ok(Self::Authenticated {
                session_id,
                user,
                authenticated_at,
            }),
            Self::PendingRedirect { .. } | Self::Authenticated { .. } => {
                Err(InvalidTransitionError)
            }
        }
    }

    /// The session ended outside of our control. Always succeeds.
    #[must_use]
    pub fn expire(self) -> Self {
        Self::Unauthenticated
    }

    #[must_use]
    pub fn session_id(&self) -> Option<Ulid> {
        match self {
            Self::Authenticated { session_id, .. } => Some(*session_id),
            Self::Unauthenticated | Self::PendingRedirect { .. } => None,
        }
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserHandle> {
        match self {
            Self::Authenticated { user, .. } => Some(user),
            Self::Unauthenticated | Self::PendingRedirect { .. } => None,
        }
    }

    #[must_use]
    pub fn pending_correlation(&self) -> Option<&CorrelationToken> {
        match self {
            Self::PendingRedirect { correlation, .. } => Some(correlation),
            Self::Unauthenticated | Self::Authenticated { .. } => None,
        }
    }

    #[must_use]
    pub fn intent(&self) -> Option<&RedirectIntent> {
        match self {
            Self::PendingRedirect { intent, .. } => Some(intent),
            Self::Unauthenticated | Self::Authenticated { .. } => None,
        }
    }

    /// Returns `true` if the session state is [`Unauthenticated`].
    ///
    /// [`Unauthenticated`]: SessionState::Unauthenticated
    #[must_use]
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }

    /// Returns `true` if the session state is [`PendingRedirect`].
    ///
    /// [`PendingRedirect`]: SessionState::PendingRedirect
    #[must_use]
    pub fn is_pending_redirect(&self) -> bool {
        matches!(self, Self::PendingRedirect { .. })
    }

    /// Returns `true` if the session state is [`Authenticated`].
    ///
    /// [`Authenticated`]: SessionState::Authenticated
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}
