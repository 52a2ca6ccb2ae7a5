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

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

mod environments;
mod platform;
mod provider;

pub use self::{
    environments::{EnvironmentConfig, EnvironmentsConfig, InvalidRedirectUrlError, RedirectUrl},
    platform::PlatformConfig,
    provider::{ProviderConfig, SecretRef, KNOWN_ATTRIBUTES},
};
use crate::util::ConfigurationSection;

/// Configuration descriptor root
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RootConfig {
    /// The external OIDC provider, shared by every environment
    pub provider: ProviderConfig,

    /// Settings of the managed identity platform
    #[serde(default)]
    pub platform: PlatformConfig,

    /// Per-environment bindings, keyed by environment name
    pub environments: EnvironmentsConfig,
}

impl ConfigurationSection for RootConfig {
    fn validate(&self, figment: &figment::Figment) -> Result<(), figment::error::Error> {
        self.provider.validate(figment)?;
        self.platform.validate(figment)?;
        self.environments.validate(figment)?;

        Ok(())
    }
}
