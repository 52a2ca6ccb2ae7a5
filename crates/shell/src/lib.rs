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

//! The relying-party shell.
//!
//! The shell never talks to the identity provider itself. An external
//! [`AuthClient`] owns the session and performs the redirects; the shell
//! builds the redirect requests, follows the [`AuthEvent`]s the client emits,
//! and renders a [`View`] of the last known state.
//!
//! # Flows
//!
//! - Login: [`Shell::begin_sign_in`] sends the browser to the hosted UI's
//!   authorization endpoint, with PKCE. The client reports the outcome with an
//!   [`AuthEvent::Callback`] carrying the same correlation token.
//! - Logout: [`Shell::sign_out`] sends the browser to the hosted UI's logout
//!   endpoint.
//! - Profile: once a session is known, the attributes are fetched in the
//!   background, and only committed if that session is still current.

#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod client;
pub mod error;
pub mod requests;
mod shell;
mod view;

pub use self::{
    client::{AuthClient, AuthEvent, CallbackOutcome, SignInRequest, SignOutRequest},
    error::{ClientError, ShellError},
    shell::{Shell, UserAction, ATTRIBUTES_READ},
    view::View,
};
