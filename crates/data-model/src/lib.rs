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

#![allow(clippy::module_name_repetitions)]

//! Types shared between the descriptor, the shell and the command line.

use thiserror::Error;

pub mod clock;
mod runtime_config;
mod session;
mod user;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid state transition")]
pub struct InvalidTransitionError;

pub use self::{
    clock::{Clock, MockClock, SystemClock},
    runtime_config::{
        AuthRuntimeConfig, ResponseType, RuntimeConfig, RuntimeConfigError,
        RUNTIME_CONFIG_VERSION,
    },
    session::{CorrelationToken, RedirectIntent, SessionState},
    user::{UserAttributes, UserHandle, EMAIL_ATTRIBUTE},
};
