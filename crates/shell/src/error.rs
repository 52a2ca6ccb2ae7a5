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

//! The error types used in this crate.

use rp_data_model::{InvalidTransitionError, RuntimeConfigError};
use thiserror::Error;

/// All possible errors of the shell operations.
#[derive(Debug, Error)]
pub enum ShellError {
    /// An auth operation was attempted before [`initialize`].
    ///
    /// [`initialize`]: crate::Shell::initialize
    #[error("the auth client is not configured yet")]
    NotInitialized,

    /// The auth client is already configured with another configuration.
    #[error("the auth client is already configured with a different configuration")]
    AlreadyInitialized,

    /// The runtime configuration has no app client ID.
    #[error("the runtime configuration has no app client ID")]
    MissingAppClientId,

    /// The shell reads an attribute which the provider does not map.
    #[error("the shell reads the {0:?} attribute, which is not mapped from the provider")]
    UnmappedAttribute(String),

    /// The requested identity provider is not configured.
    #[error("unknown identity provider {0:?}")]
    UnknownProvider(String),

    /// No redirect target is allowed.
    #[error("no {0} redirect target is configured")]
    NoRedirectTarget(&'static str),

    /// The origin the shell is served from is not an allowed redirect target.
    #[error("origin {origin:?} is not an allowed {kind} redirect target")]
    OriginNotAllowed {
        /// The origin of the shell
        origin: String,
        /// Which allow list was searched
        kind: &'static str,
    },

    /// The runtime configuration is invalid.
    #[error(transparent)]
    RuntimeConfig(#[from] RuntimeConfigError),

    /// The operation is not allowed in the current session state.
    #[error("operation not allowed in the current session state")]
    InvalidTransition(#[from] InvalidTransitionError),

    /// The redirect request could not be built.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The auth client failed.
    #[error("the auth client failed")]
    Client(#[from] ClientError),
}

/// All possible errors when building a redirect request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The hosted UI base is invalid.
    #[error(transparent)]
    HostedDomain(#[from] RuntimeConfigError),

    /// An endpoint URL could not be built.
    #[error(transparent)]
    Url(#[from] url::ParseError),

    /// The query could not be encoded.
    #[error(transparent)]
    UrlEncoded(#[from] serde_urlencoded::ser::Error),
}

/// Errors reported by an [`AuthClient`].
///
/// [`AuthClient`]: crate::AuthClient
#[derive(Debug, Error)]
pub enum ClientError {
    /// The backing service can't be reached.
    #[error("the auth service is unavailable: {0}")]
    Unavailable(String),

    /// The backing service refused the request.
    #[error("the auth service rejected the request: {0}")]
    Rejected(String),

    /// Any other error.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
