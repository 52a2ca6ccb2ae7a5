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

#![deny(missing_docs, rustdoc::missing_crate_level_docs)]
#![allow(clippy::module_name_repetitions)]

//! Configuration descriptor of the OIDC relying party.
//!
//! A descriptor is written once and bound to several deployment
//! environments. The provider registration is shared between all of them,
//! while each environment brings its own hosted-domain label and redirect
//! allow lists.

mod descriptor;
pub(crate) mod schema;
mod secrets;
mod sections;
pub(crate) mod util;

pub use self::{
    descriptor::{
        check_interchangeable, Descriptor, InterchangeabilityError, ProviderRegistration,
        UnknownEnvironmentError,
    },
    schema::json_schema,
    secrets::{ClientCredentials, EnvSecretStore, SecretError, SecretStore, StaticSecretStore},
    sections::*,
    util::{layered_figment, ConfigurationSection, ConfigurationSectionExt, ENV_PREFIX},
};
